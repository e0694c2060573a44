//! Snapshot file name metadata
//!
//! Names follow `{country_slug}_{YYYY-MM-DD}_{HH-MM-SS}.json`. The slug may
//! itself contain underscores, so the last two segments are the date and
//! time and everything before them is the country.

use crate::constants::SNAPSHOT_DATE_FORMAT;
use crate::error::{ChartError, Result};
use chrono::{Local, NaiveDate};
use std::path::Path;
use tracing::warn;

/// Country and raw date segment taken from a snapshot file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotName {
    pub country: String,
    pub date_segment: String,
}

/// Chart date with a flag marking the today-fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartDate {
    pub date: NaiveDate,
    pub inferred: bool,
}

impl SnapshotName {
    /// Split the file stem of `path` into country and date segment
    pub fn parse(path: &Path) -> Result<Self> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ChartError::malformed(path, "file name is not valid UTF-8"))?;

        let parts: Vec<&str> = stem.split('_').collect();
        if parts.len() < 3 {
            return Err(ChartError::malformed(
                path,
                format!(
                    "file name '{}' does not follow {{country}}_{{date}}_{{time}}",
                    stem
                ),
            ));
        }

        let split = parts.len() - 2;
        Ok(Self {
            country: parts[..split].join("_"),
            date_segment: parts[split].to_string(),
        })
    }

    /// Parse the date segment, falling back to today with a warning
    pub fn chart_date(&self, path: &Path) -> ChartDate {
        match NaiveDate::parse_from_str(&self.date_segment, SNAPSHOT_DATE_FORMAT) {
            Ok(date) => ChartDate {
                date,
                inferred: false,
            },
            Err(e) => {
                let today = Local::now().date_naive();
                warn!(
                    "Invalid date '{}' in {} ({}); using {}",
                    self.date_segment,
                    path.display(),
                    e,
                    today
                );
                ChartDate {
                    date: today,
                    inferred: true,
                }
            }
        }
    }
}
