//! Command-line argument definitions for the chart processor
//!
//! One subcommand per pipeline stage: a single chart fetch, a full
//! ingestion run, the JSON to Parquet transform, and the periodic trigger.

use crate::config::ChartConfig;
use crate::constants::{
    DEFAULT_LIMIT, DEFAULT_PAGE, DEFAULT_REQUEST_DELAY_SECS, DEFAULT_SCHEDULE_INTERVAL_HOURS,
};
use crate::error::{ChartError, Result};
use crate::models::ChartType;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Fetch country-level music charts and flatten them into Parquet datasets
#[derive(Debug, Clone, Parser)]
#[command(
    name = "chart_processor",
    version,
    about = "Fetch country-level top artist/track charts and combine raw snapshots into Parquet",
    long_about = "Pulls geo top-artists and top-tracks charts from the Last.fm API, stores each \
                  response as a raw JSON snapshot, and flattens a directory of snapshots into \
                  one combined, analysis-ready Parquet dataset."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: debug, -vv: trace)"
    )]
    pub verbose: u8,

    /// Only show errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Fetch one chart for one country and save the raw response
    Fetch(FetchArgs),
    /// Fetch artists and tracks for every configured country
    Ingest(IngestArgs),
    /// Combine a directory of raw snapshots into one Parquet file
    Transform(TransformArgs),
    /// Run ingestion on a fixed interval until interrupted
    Schedule(ScheduleArgs),
}

/// Arguments for the fetch command
#[derive(Debug, Clone, ClapArgs)]
pub struct FetchArgs {
    #[arg(
        short = 'c',
        long = "country",
        value_name = "NAME",
        help = "Country to fetch data for"
    )]
    pub country: String,

    #[arg(
        short = 't',
        long = "type",
        value_enum,
        help = "Type of chart to fetch"
    )]
    pub chart_type: ChartType,

    #[arg(
        short = 'l',
        long = "limit",
        default_value_t = DEFAULT_LIMIT,
        help = "Number of results to return per page"
    )]
    pub limit: u32,

    #[arg(
        short = 'p',
        long = "page",
        default_value_t = DEFAULT_PAGE,
        help = "Page number to fetch"
    )]
    pub page: u32,
}

/// Arguments for the ingest command
#[derive(Debug, Clone, ClapArgs)]
pub struct IngestArgs {
    #[arg(
        short = 'l',
        long = "limit",
        default_value_t = DEFAULT_LIMIT,
        help = "Number of top items to fetch per country"
    )]
    pub limit: u32,

    #[arg(
        short = 'd',
        long = "delay",
        value_name = "SECONDS",
        default_value_t = DEFAULT_REQUEST_DELAY_SECS,
        help = "Delay in seconds after each API request"
    )]
    pub delay: f64,
}

/// Arguments for the transform command
#[derive(Debug, Clone, ClapArgs)]
pub struct TransformArgs {
    #[arg(
        short = 't',
        long = "type",
        value_enum,
        default_value_t = ChartType::Artists,
        help = "Chart type of the snapshots being combined"
    )]
    pub chart_type: ChartType,

    /// Directory of raw snapshots
    ///
    /// Defaults to `{data_root}/{type}`, e.g. data/raw/geo/artists.
    #[arg(
        short = 'j',
        long = "json-path",
        value_name = "PATH",
        help = "Directory containing raw JSON snapshots"
    )]
    pub json_path: Option<PathBuf>,

    /// Root below which silver/geo/{type}/ is created
    #[arg(
        short = 'o',
        long = "output-dir",
        value_name = "PATH",
        help = "Output root for the combined Parquet file"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long = "file-timeout",
        value_name = "SECONDS",
        help = "Give up on a single snapshot after this many seconds"
    )]
    pub file_timeout: Option<u64>,
}

/// Arguments for the schedule command
#[derive(Debug, Clone, ClapArgs)]
pub struct ScheduleArgs {
    #[arg(
        long = "interval-hours",
        value_name = "HOURS",
        default_value_t = DEFAULT_SCHEDULE_INTERVAL_HOURS,
        help = "Hours between ingestion runs"
    )]
    pub interval_hours: u64,

    #[arg(
        short = 'l',
        long = "limit",
        default_value_t = DEFAULT_LIMIT,
        help = "Number of top items to fetch per country"
    )]
    pub limit: u32,

    #[arg(
        short = 'd',
        long = "delay",
        value_name = "SECONDS",
        default_value_t = DEFAULT_REQUEST_DELAY_SECS,
        help = "Delay in seconds after each API request"
    )]
    pub delay: f64,

    #[arg(long = "run-now", help = "Also run once immediately at startup")]
    pub run_now: bool,
}

impl Args {
    /// Map verbosity flags to a tracing level
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }

    /// Banners, progress bars and summaries are shown unless `--quiet`
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }
}

impl IngestArgs {
    /// Overlay the command flags on a base configuration
    pub fn apply(&self, config: ChartConfig) -> Result<ChartConfig> {
        let config = config
            .with_limit(self.limit)
            .with_request_delay_secs(self.delay);
        config.validate()?;
        Ok(config)
    }
}

impl TransformArgs {
    pub fn apply(&self, config: ChartConfig) -> Result<ChartConfig> {
        let mut config = config;
        if let Some(output_dir) = &self.output_dir {
            config = config.with_output_root(output_dir);
        }
        if let Some(seconds) = self.file_timeout {
            if seconds == 0 {
                return Err(ChartError::configuration(
                    "file timeout must be at least one second",
                ));
            }
            config = config.with_file_timeout_secs(seconds);
        }
        Ok(config)
    }

    /// Snapshot directory to read
    pub fn input_dir(&self, config: &ChartConfig) -> PathBuf {
        self.json_path
            .clone()
            .unwrap_or_else(|| config.data_root.join(self.chart_type.as_str()))
    }
}

impl ScheduleArgs {
    pub fn apply(&self, config: ChartConfig) -> Result<ChartConfig> {
        let config = config
            .with_limit(self.limit)
            .with_request_delay_secs(self.delay)
            .with_schedule_interval_hours(self.interval_hours);
        config.validate()?;
        Ok(config)
    }
}
