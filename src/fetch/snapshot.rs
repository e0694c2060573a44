//! Raw snapshot persistence
//!
//! Snapshots land at `{data_root}/{chart_type}/{country_slug}_{timestamp}.json`
//! and are never modified afterwards.

use crate::constants::SNAPSHOT_TIMESTAMP_FORMAT;
use crate::error::Result;
use crate::models::ChartType;
use chrono::{Local, NaiveDateTime};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Writes fetched chart bodies to the raw data area
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    data_root: PathBuf,
}

impl SnapshotWriter {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    /// Directory holding snapshots of one chart type
    pub fn chart_dir(&self, chart_type: ChartType) -> PathBuf {
        self.data_root.join(chart_type.as_str())
    }

    /// Save a response body stamped with the current local time
    pub fn save(&self, document: &Value, country: &str, chart_type: ChartType) -> Result<PathBuf> {
        self.save_at(document, country, chart_type, Local::now().naive_local())
    }

    /// Save a response body stamped with `timestamp`
    pub fn save_at(
        &self,
        document: &Value,
        country: &str,
        chart_type: ChartType,
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf> {
        let folder = self.chart_dir(chart_type);
        fs::create_dir_all(&folder)?;

        let file_path = folder.join(snapshot_file_name(country, timestamp));
        let body = serde_json::to_string_pretty(document)?;
        fs::write(&file_path, body)?;

        info!(
            "Saved {} data for {} → {}",
            chart_type,
            country,
            file_path.display()
        );
        Ok(file_path)
    }
}

/// Lowercase, spaces replaced by underscores
pub fn country_slug(country: &str) -> String {
    country.to_lowercase().replace(' ', "_")
}

/// `{country_slug}_{YYYY-MM-DD_HH-MM-SS}.json`
pub fn snapshot_file_name(country: &str, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}.json",
        country_slug(country),
        timestamp.format(SNAPSHOT_TIMESTAMP_FORMAT)
    )
}
