//! Command implementations for the chart processor CLI
//!
//! Each subcommand builds on a [`ChartConfig`] loaded from the environment,
//! overlays its own flags, and reports results with coloured summaries.
//! Library errors are wrapped with `anyhow` context at this edge.

use crate::cli::args::{Args, Commands, FetchArgs, IngestArgs, ScheduleArgs, TransformArgs};
use crate::config::ChartConfig;
use crate::error::ChartError;
use crate::fetch::{ChartClient, SnapshotWriter};
use crate::ingest::scheduler::Scheduler;
use crate::ingest::{IngestionClient, IngestionReport, run_ingestion};
use crate::processor::{BatchMerger, MergeOutcome};
use anyhow::{Context, Result};
use colored::*;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Main command runner
pub async fn run(args: Args, cancellation_token: CancellationToken) -> Result<()> {
    setup_logging(&args);
    let show_progress = args.show_progress();

    let Some(command) = args.command else {
        return Ok(());
    };

    let config = ChartConfig::from_env();
    debug!(
        "Loaded configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    match command {
        Commands::Fetch(fetch_args) => {
            until_cancelled(run_fetch(&fetch_args, config), &cancellation_token).await
        }
        Commands::Ingest(ingest_args) => {
            until_cancelled(run_ingest(&ingest_args, config), &cancellation_token).await
        }
        Commands::Transform(transform_args) => {
            until_cancelled(
                run_transform(&transform_args, config, show_progress),
                &cancellation_token,
            )
            .await
        }
        Commands::Schedule(schedule_args) => {
            run_schedule(&schedule_args, config, cancellation_token).await
        }
    }
}

/// Run `operation`, abandoning it once the token is cancelled
async fn until_cancelled<F>(operation: F, cancellation_token: &CancellationToken) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    tokio::select! {
        result = operation => result,
        _ = cancellation_token.cancelled() => Err(ChartError::Interrupted {
            reason: "Processing interrupted by user".to_string(),
        }
        .into()),
    }
}

/// Fetch one chart page and save it as a raw snapshot
pub async fn run_fetch(args: &FetchArgs, config: ChartConfig) -> Result<()> {
    let config = config.with_limit(args.limit);
    config.validate()?;
    if args.page == 0 {
        return Err(ChartError::configuration("page numbers start at 1").into());
    }

    let Some(client) = build_client(&config)? else {
        return Ok(());
    };

    info!("Fetching top {} for {}...", args.chart_type, args.country);
    let document = client
        .fetch(&args.country, args.chart_type, args.limit, args.page)
        .await?;

    SnapshotWriter::new(&config.data_root)
        .save(&document, &args.country, args.chart_type)
        .with_context(|| format!("Failed to save {} data for {}", args.chart_type, args.country))?;
    Ok(())
}

/// Fetch both chart types for every configured country
pub async fn run_ingest(args: &IngestArgs, config: ChartConfig) -> Result<()> {
    let config = args.apply(config)?;
    let Some(client) = build_client(&config)? else {
        return Ok(());
    };

    let ingestion = IngestionClient::new(client, &config)?;
    let report = ingestion.run().await;
    print_ingestion_summary(&report);
    Ok(())
}

/// Combine one directory of snapshots into a Parquet dataset
pub async fn run_transform(
    args: &TransformArgs,
    config: ChartConfig,
    show_progress: bool,
) -> Result<()> {
    let config = args.apply(config)?;
    let input_dir = args.input_dir(&config);

    let merger = BatchMerger::new(args.chart_type, &config).with_progress(show_progress);
    let outcome = merger
        .merge_directory(&input_dir, &config.output_root)
        .await
        .with_context(|| format!("Failed to transform {} snapshots", args.chart_type))?;

    if show_progress {
        print_failures(&outcome);
    }
    Ok(())
}

/// Run ingestion every interval until shutdown
pub async fn run_schedule(
    args: &ScheduleArgs,
    config: ChartConfig,
    cancellation_token: CancellationToken,
) -> Result<()> {
    let config = args.apply(config)?;
    if config.api.api_key.is_none() {
        report_missing_api_key();
        return Ok(());
    }

    let scheduler = Scheduler::new(config.schedule_interval()).with_run_immediately(args.run_now);
    let config = Arc::new(config);
    let job = move || {
        let config = Arc::clone(&config);
        async move {
            info!("Running chart data fetch job");
            match run_ingestion(&config).await {
                Ok(report) => {
                    print_ingestion_summary(&report);
                    info!("Job completed");
                }
                Err(e) => error!("Scheduled ingestion failed: {:#}", e),
            }
        }
    };

    let stats = scheduler.run_until(job, cancellation_token).await;
    println!("\n{}", "Scheduler stopped".bright_green().bold());
    println!(
        "  {} {}",
        "Runs started:".bright_cyan(),
        stats.started.to_string().bright_white()
    );
    if stats.skipped > 0 {
        println!(
            "  {} {}",
            "Ticks skipped:".bright_yellow(),
            stats.skipped.to_string().bright_yellow()
        );
    }
    Ok(())
}

/// HTTP client, or `None` after reporting a missing API key
fn build_client(config: &ChartConfig) -> Result<Option<ChartClient>> {
    match ChartClient::new(&config.api) {
        Ok(client) => Ok(Some(client)),
        Err(ChartError::MissingApiKey { .. }) => {
            report_missing_api_key();
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

fn report_missing_api_key() {
    let err = ChartError::MissingApiKey {
        var: crate::constants::API_KEY_ENV.to_string(),
    };
    eprintln!("{} {}.", "Error:".bright_red().bold(), err.to_string().bright_red());
}

fn print_ingestion_summary(report: &IngestionReport) {
    println!("\n{}", "Ingestion Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Requests:".bright_cyan(),
        report.attempted.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Snapshots saved:".bright_cyan(),
        report.succeeded().to_string().bright_white().bold()
    );
    if !report.is_complete() {
        println!(
            "  {} {}",
            "Failed:".bright_red(),
            report.failures.len().to_string().bright_red().bold()
        );
        for failure in &report.failures {
            println!(
                "    {} {} ({})",
                "-".bright_red(),
                failure.country,
                failure.chart_type
            );
        }
    }
}

fn print_failures(outcome: &MergeOutcome) {
    if outcome.failures.is_empty() {
        return;
    }
    println!("\n{}", "Skipped files".bright_yellow().bold());
    for failure in &outcome.failures {
        println!(
            "  {} {}: {}",
            "-".bright_yellow(),
            failure.path.display(),
            failure.error
        );
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("chart_processor={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", log_level);
}
