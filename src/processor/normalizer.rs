//! Record normalization for chart snapshots
//!
//! Turns one raw snapshot file into a table of canonical rows: items are
//! flattened, renamed per chart type, stripped of `image`, stamped with
//! country/date/load time from the file name and coerced to integers where
//! the schema requires. A file either normalizes completely or fails.

use super::filename::SnapshotName;
use super::flatten::FlatTable;
use crate::constants::columns;
use crate::error::{ChartError, Result};
use crate::models::{ChartPayload, ChartType};
use chrono::{Datelike, Local, NaiveDateTime};
use polars::prelude::*;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Days between 0001-01-01 (CE day 1) and 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Normalizer for one chart type
#[derive(Debug, Clone, Copy)]
pub struct RecordNormalizer {
    chart_type: ChartType,
}

impl RecordNormalizer {
    pub fn new(chart_type: ChartType) -> Self {
        Self { chart_type }
    }

    pub fn chart_type(&self) -> ChartType {
        self.chart_type
    }

    /// Normalize `path`, stamping rows with the current local time
    pub fn normalize(&self, path: &Path) -> Result<DataFrame> {
        self.normalize_at(path, Local::now().naive_local())
    }

    /// Normalize `path` with an explicit load time
    pub fn normalize_at(&self, path: &Path, load_time: NaiveDateTime) -> Result<DataFrame> {
        debug!("Normalizing {} snapshot: {}", self.chart_type, path.display());

        let text = fs::read_to_string(path)?;
        let payload = ChartPayload::parse(self.chart_type, &text).map_err(|e| {
            let (outer, inner) = self.chart_type.envelope_path();
            ChartError::malformed(path, format!("expected {}.{}: {}", outer, inner, e))
        })?;

        if payload.items().is_empty() {
            return Err(ChartError::malformed(path, "chart contains no items"));
        }

        let mut table = FlatTable::from_items(payload.items());
        let field_map = self.chart_type.field_map();
        for (raw, canonical) in field_map {
            table.rename(raw, canonical);
        }
        // Items without artwork have no `image` field; such files are accepted
        table.drop_column(columns::IMAGE);

        let canonical: Vec<&str> = field_map.iter().map(|(_, canonical)| *canonical).collect();
        table.move_to_front(&canonical);

        let integer_columns = self.chart_type.integer_columns();
        for required in integer_columns {
            if !table.contains(required) {
                return Err(ChartError::malformed(
                    path,
                    format!("chart items have no '{}' field", required),
                ));
            }
        }

        let name = SnapshotName::parse(path)?;
        let chart_date = name.chart_date(path);

        let rows = table.height();
        let df = DataFrame::new(table.into_columns(&integer_columns, path)?)?;

        let days = chart_date.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE;
        let load_micros = load_time.and_utc().timestamp_micros();

        let df = df
            .lazy()
            .with_columns([
                lit(name.country.clone()).alias(columns::CHART_COUNTRY),
                lit(days).cast(DataType::Date).alias(columns::CHART_DATE),
                lit(load_micros)
                    .cast(DataType::Datetime(TimeUnit::Microseconds, None))
                    .alias(columns::LOAD_TIME),
                lit(chart_date.inferred).alias(columns::DATE_INFERRED),
            ])
            .collect()?;

        debug!(
            "Normalized {} rows for {} ({})",
            rows, name.country, chart_date.date
        );
        Ok(df)
    }
}
