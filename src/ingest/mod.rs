//! Multi-country ingestion run.
//!
//! Pulls both chart types for every configured country, one request at a
//! time with a fixed pause after each request. A failed request or save is
//! reported and the run moves on to the next (country, chart type) pair.

pub mod scheduler;

use crate::config::ChartConfig;
use crate::constants::DEFAULT_PAGE;
use crate::error::{ChartError, Result};
use crate::fetch::{ChartClient, ChartSource, SnapshotWriter};
use crate::models::ChartType;
use chrono::Local;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// One (country, chart type) pair that did not produce a snapshot
#[derive(Debug)]
pub struct IngestionFailure {
    pub country: String,
    pub chart_type: ChartType,
    pub error: ChartError,
}

/// Outcome of one ingestion run
#[derive(Debug, Default)]
pub struct IngestionReport {
    pub attempted: usize,
    pub saved: Vec<PathBuf>,
    pub failures: Vec<IngestionFailure>,
}

impl IngestionReport {
    pub fn succeeded(&self) -> usize {
        self.saved.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Sequential fetcher over a country list
#[derive(Debug)]
pub struct IngestionClient<S> {
    source: S,
    snapshots: SnapshotWriter,
    countries: Vec<String>,
    limit: u32,
    delay: Duration,
}

impl<S: ChartSource> IngestionClient<S> {
    /// Build a run over `config.countries`; an empty list is rejected
    pub fn new(source: S, config: &ChartConfig) -> Result<Self> {
        if config.countries.is_empty() {
            return Err(ChartError::configuration(
                "No countries provided for data fetching",
            ));
        }

        info!(
            "Loaded {} countries for data fetching",
            config.countries.len()
        );
        Ok(Self {
            source,
            snapshots: SnapshotWriter::new(&config.data_root),
            countries: config.countries.clone(),
            limit: config.limit,
            delay: config.request_delay(),
        })
    }

    /// Fetch and save artists then tracks for each country in order
    pub async fn run(&self) -> IngestionReport {
        let start_time = Local::now();
        info!(
            "Starting chart ingestion at {}",
            start_time.format("%Y-%m-%d %H:%M:%S")
        );

        let mut report = IngestionReport::default();
        for country in &self.countries {
            for chart_type in ChartType::ALL {
                report.attempted += 1;
                info!("Fetching top {} for {}...", chart_type, country);

                match self.fetch_and_save(country, chart_type).await {
                    Ok(path) => report.saved.push(path),
                    Err(e) => {
                        error!("Error fetching {} for {}: {:#}", chart_type, country, e);
                        report.failures.push(IngestionFailure {
                            country: country.clone(),
                            chart_type,
                            error: e,
                        });
                    }
                }

                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        info!(
            "Finished ingestion at {} ({}/{} snapshots saved)",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            report.succeeded(),
            report.attempted
        );
        info!(
            "Data saved under {} and {}",
            self.snapshots.chart_dir(ChartType::Artists).display(),
            self.snapshots.chart_dir(ChartType::Tracks).display()
        );
        report
    }

    async fn fetch_and_save(&self, country: &str, chart_type: ChartType) -> Result<PathBuf> {
        let document = self
            .source
            .fetch(country, chart_type, self.limit, DEFAULT_PAGE)
            .await?;
        self.snapshots.save(&document, country, chart_type)
    }
}

/// Run one ingestion over the live API
pub async fn run_ingestion(config: &ChartConfig) -> Result<IngestionReport> {
    let client = ChartClient::new(&config.api)?;
    let ingestion = IngestionClient::new(client, config)?;
    Ok(ingestion.run().await)
}
