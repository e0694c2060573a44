//! Periodic ingestion trigger
//!
//! Fires a job every `period`. A tick that arrives while the previous run
//! is still in progress is skipped and logged, so two runs never overlap.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Single-slot guard marking a run as in progress
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

/// Held for the duration of a run; releases the guard on drop
#[derive(Debug)]
pub struct RunPermit {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot, or `None` when a run already holds it
    pub fn try_start(&self) -> Option<RunPermit> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunPermit {
                running: Arc::clone(&self.running),
            })
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Counters reported when the scheduler stops
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerStats {
    pub started: usize,
    pub skipped: usize,
}

/// Interval trigger for ingestion runs
#[derive(Debug)]
pub struct Scheduler {
    period: Duration,
    run_immediately: bool,
    guard: RunGuard,
}

impl Scheduler {
    /// First run happens one `period` after start
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            run_immediately: false,
            guard: RunGuard::new(),
        }
    }

    /// Also run once at start
    pub fn with_run_immediately(mut self, run_immediately: bool) -> Self {
        self.run_immediately = run_immediately;
        self
    }

    /// Trigger `job` every period until `cancellation_token` is cancelled.
    ///
    /// A run still in flight at shutdown is aborted.
    pub async fn run_until<F, Fut>(
        &self,
        job: F,
        cancellation_token: CancellationToken,
    ) -> SchedulerStats
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut ticker = tokio::time::interval_at(self.first_tick(Instant::now()), self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Scheduler started, fetching data every {}",
            describe_period(self.period)
        );

        let mut current: Option<JoinHandle<()>> = None;
        let mut stats = SchedulerStats::default();

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Shutdown requested, stopping scheduler");
                    if let Some(handle) = current.take() {
                        if !handle.is_finished() {
                            warn!("Aborting ingestion run in progress");
                            handle.abort();
                        }
                    }
                    break;
                }
                _ = ticker.tick() => {
                    match self.guard.try_start() {
                        Some(permit) => {
                            stats.started += 1;
                            info!("Running scheduled ingestion job #{}", stats.started);
                            let run = job();
                            current = Some(tokio::spawn(async move {
                                let _permit = permit;
                                run.await;
                            }));
                        }
                        None => {
                            stats.skipped += 1;
                            warn!("Previous ingestion run still in progress, skipping this tick");
                        }
                    }
                }
            }
        }

        stats
    }

    /// `now`, or one period later; periods past the clock's range wait thirty years
    fn first_tick(&self, now: Instant) -> Instant {
        if self.run_immediately {
            return now;
        }
        now.checked_add(self.period)
            .unwrap_or_else(|| now + Duration::from_secs(FAR_FUTURE_SECS))
    }
}

/// Roughly thirty years
const FAR_FUTURE_SECS: u64 = 86_400 * 365 * 30;

fn describe_period(period: Duration) -> String {
    let secs = period.as_secs();
    if secs >= 3600 && secs % 3600 == 0 {
        format!("{} hours", secs / 3600)
    } else {
        format!("{:?}", period)
    }
}
