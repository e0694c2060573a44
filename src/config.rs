//! Configuration management and validation.
//!
//! Every component receives its settings from an explicit [`ChartConfig`]
//! built at startup, so tests can point the fetcher at a local endpoint and
//! the writers at temporary directories.

use crate::constants::{
    API_KEY_ENV, BASE_URL_ENV, DEFAULT_BASE_URL, DEFAULT_COUNTRIES, DEFAULT_DATA_ROOT,
    DEFAULT_LIMIT, DEFAULT_OUTPUT_ROOT, DEFAULT_REQUEST_DELAY_SECS,
    DEFAULT_SCHEDULE_INTERVAL_HOURS, MAX_SCHEDULE_INTERVAL_HOURS, REQUEST_TIMEOUT_SECS,
};
use crate::error::{ChartError, Result};
use polars::prelude::ParquetCompression;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Supported compression algorithms for parquet files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionAlgorithm {
    /// Snappy compression - good balance of speed and compression
    Snappy,
    /// ZSTD compression - better compression ratio, slower
    Zstd,
    /// LZ4 compression - fastest, lower compression ratio
    Lz4,
    /// No compression
    Uncompressed,
}

impl CompressionAlgorithm {
    /// Convert to polars ParquetCompression type
    pub fn to_polars_compression(&self) -> ParquetCompression {
        match self {
            CompressionAlgorithm::Snappy => ParquetCompression::Snappy,
            CompressionAlgorithm::Zstd => ParquetCompression::Zstd(None),
            CompressionAlgorithm::Lz4 => ParquetCompression::Lz4Raw,
            CompressionAlgorithm::Uncompressed => ParquetCompression::Uncompressed,
        }
    }
}

/// Connection settings for the chart API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Endpoint receiving the GET requests
    pub base_url: String,

    /// API key; fetching is refused when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Global configuration for chart ingestion and transforms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart API connection
    pub api: ApiConfig,

    /// Root of raw snapshots (`{data_root}/{artists|tracks}/`)
    pub data_root: PathBuf,

    /// Root of combined outputs (`{output_root}/silver/geo/{type}/`)
    pub output_root: PathBuf,

    /// Countries pulled by an ingestion run
    pub countries: Vec<String>,

    /// Items per page
    pub limit: u32,

    /// Pause after each request, in seconds
    pub request_delay_secs: f64,

    /// Interval between scheduled runs, in hours
    pub schedule_interval_hours: u64,

    /// Compression for combined datasets
    pub compression: CompressionAlgorithm,

    /// Deadline for normalizing one snapshot (None = no deadline)
    pub file_timeout_secs: Option<u64>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            countries: DEFAULT_COUNTRIES.iter().map(|c| c.to_string()).collect(),
            limit: DEFAULT_LIMIT,
            request_delay_secs: DEFAULT_REQUEST_DELAY_SECS,
            schedule_interval_hours: DEFAULT_SCHEDULE_INTERVAL_HOURS,
            compression: CompressionAlgorithm::Snappy,
            file_timeout_secs: None,
        }
    }
}

impl ChartConfig {
    /// Defaults overlaid with `.env` and process environment.
    ///
    /// A missing API key is not an error here; commands that fetch report it.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let mut config = Self::default();
        config.api.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            config.api.base_url = base_url;
        }
        config
    }

    /// Set the API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api.api_key = Some(api_key.into());
        self
    }

    /// Set the API base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Set the raw snapshot root
    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    /// Set the combined output root
    pub fn with_output_root(mut self, output_root: impl Into<PathBuf>) -> Self {
        self.output_root = output_root.into();
        self
    }

    /// Replace the country list
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }

    /// Set items per page
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Set the pause after each request
    pub fn with_request_delay_secs(mut self, delay: f64) -> Self {
        self.request_delay_secs = delay;
        self
    }

    /// Set the scheduled run interval
    pub fn with_schedule_interval_hours(mut self, hours: u64) -> Self {
        self.schedule_interval_hours = hours;
        self
    }

    /// Set a per-file normalization deadline
    pub fn with_file_timeout_secs(mut self, seconds: u64) -> Self {
        self.file_timeout_secs = Some(seconds);
        self
    }

    /// Set parquet compression
    pub fn with_compression(mut self, compression: CompressionAlgorithm) -> Self {
        self.compression = compression;
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_secs_f64(self.request_delay_secs.max(0.0))
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_hours.saturating_mul(3600))
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        self.file_timeout_secs.map(Duration::from_secs)
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 {
            return Err(ChartError::configuration("limit must be at least 1"));
        }
        if !self.request_delay_secs.is_finite() || self.request_delay_secs < 0.0 {
            return Err(ChartError::configuration(
                "request delay must be a non-negative number of seconds",
            ));
        }
        if self.schedule_interval_hours == 0 {
            return Err(ChartError::configuration(
                "schedule interval must be at least one hour",
            ));
        }
        if self.schedule_interval_hours > MAX_SCHEDULE_INTERVAL_HOURS {
            return Err(ChartError::configuration(format!(
                "schedule interval must be at most {} hours",
                MAX_SCHEDULE_INTERVAL_HOURS
            )));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ChartError::configuration("API base URL is empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChartConfig::default();
        assert_eq!(config.api.base_url, "https://ws.audioscrobbler.com/2.0/");
        assert_eq!(config.api.timeout(), Duration::from_secs(100));
        assert_eq!(config.limit, 50);
        assert_eq!(config.request_delay(), Duration::from_millis(1500));
        assert_eq!(config.schedule_interval(), Duration::from_secs(24 * 3600));
        assert_eq!(config.data_root, PathBuf::from("data/raw/geo"));
        assert!(!config.countries.is_empty());
        assert!(config.file_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = ChartConfig::default()
            .with_api_key("secret")
            .with_base_url("http://127.0.0.1:9000/")
            .with_countries(["Japan"])
            .with_limit(10)
            .with_request_delay_secs(0.0)
            .with_file_timeout_secs(5);

        assert_eq!(config.api.api_key.as_deref(), Some("secret"));
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000/");
        assert_eq!(config.countries, vec!["Japan".to_string()]);
        assert_eq!(config.limit, 10);
        assert_eq!(config.request_delay(), Duration::ZERO);
        assert_eq!(config.file_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ChartConfig::default().with_limit(0).validate().is_err());
        assert!(
            ChartConfig::default()
                .with_request_delay_secs(-1.0)
                .validate()
                .is_err()
        );
        assert!(
            ChartConfig::default()
                .with_schedule_interval_hours(0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_schedule_interval_is_bounded() {
        let longest =
            ChartConfig::default().with_schedule_interval_hours(MAX_SCHEDULE_INTERVAL_HOURS);
        assert!(longest.validate().is_ok());

        let too_long = ChartConfig::default().with_schedule_interval_hours(u64::MAX);
        assert!(matches!(
            too_long.validate(),
            Err(ChartError::Configuration { .. })
        ));
        assert_eq!(too_long.schedule_interval(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let config = ChartConfig::default().with_api_key("secret");
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }

    #[test]
    fn test_compression_conversion() {
        assert!(matches!(
            CompressionAlgorithm::Snappy.to_polars_compression(),
            ParquetCompression::Snappy
        ));
        assert!(matches!(
            CompressionAlgorithm::Uncompressed.to_polars_compression(),
            ParquetCompression::Uncompressed
        ));
    }
}
