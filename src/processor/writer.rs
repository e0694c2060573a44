//! Parquet writing for combined chart datasets
//!
//! Outputs land at `{output_root}/silver/geo/{type}/{type}_{YYYYMMDD_HHMMSS}.parquet`.
//! The frame is written to a hidden temp file in the target directory and
//! then persisted without clobbering, so a failed write leaves nothing behind
//! and an existing dataset is never overwritten.

use crate::config::CompressionAlgorithm;
use crate::constants::{OUTPUT_TIMESTAMP_FORMAT, SILVER_SEGMENTS};
use crate::error::{ChartError, Result};
use crate::models::ChartType;
use chrono::{Local, NaiveDateTime};
use polars::prelude::{DataFrame, ParquetWriter as PolarsParquetWriter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writer for combined datasets under one output root
#[derive(Debug, Clone)]
pub struct ParquetWriter {
    output_root: PathBuf,
    compression: CompressionAlgorithm,
}

impl ParquetWriter {
    pub fn new(output_root: impl Into<PathBuf>, compression: CompressionAlgorithm) -> Self {
        Self {
            output_root: output_root.into(),
            compression,
        }
    }

    /// `{output_root}/silver/geo/{type}`
    pub fn output_dir(&self, chart_type: ChartType) -> PathBuf {
        let mut dir = self.output_root.clone();
        for segment in SILVER_SEGMENTS {
            dir.push(segment);
        }
        dir.push(chart_type.as_str());
        dir
    }

    /// Write `df` stamped with the current local time
    pub fn write(&self, df: &mut DataFrame, chart_type: ChartType) -> Result<PathBuf> {
        self.write_at(df, chart_type, Local::now().naive_local())
    }

    /// Write `df` with a file name derived from `timestamp`
    pub fn write_at(
        &self,
        df: &mut DataFrame,
        chart_type: ChartType,
        timestamp: NaiveDateTime,
    ) -> Result<PathBuf> {
        let dir = self.output_dir(chart_type);
        fs::create_dir_all(&dir)?;

        let mut staged = tempfile::Builder::new()
            .prefix(".")
            .suffix(".parquet.tmp")
            .tempfile_in(&dir)?;

        PolarsParquetWriter::new(staged.as_file_mut())
            .with_compression(self.compression.to_polars_compression())
            .finish(df)
            .map_err(|e| ChartError::ProcessingFailed {
                path: dir.clone(),
                reason: format!("Failed to write parquet: {}", e),
            })?;

        let stem = output_stem(chart_type, timestamp);
        let mut attempt = 0usize;
        loop {
            let candidate = candidate_path(&dir, &stem, attempt);
            if candidate.exists() {
                attempt += 1;
                continue;
            }

            match staged.persist_noclobber(&candidate) {
                Ok(_) => {
                    debug!("Persisted combined dataset to {}", candidate.display());
                    return Ok(candidate);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    staged = e.file;
                    attempt += 1;
                }
                Err(e) => return Err(ChartError::Io(e.error)),
            }
        }
    }
}

/// `{type}_{YYYYMMDD_HHMMSS}`
pub fn output_stem(chart_type: ChartType, timestamp: NaiveDateTime) -> String {
    format!(
        "{}_{}",
        chart_type.as_str(),
        timestamp.format(OUTPUT_TIMESTAMP_FORMAT)
    )
}

fn candidate_path(dir: &Path, stem: &str, attempt: usize) -> PathBuf {
    if attempt == 0 {
        dir.join(format!("{}.parquet", stem))
    } else {
        dir.join(format!("{}_{}.parquet", stem, attempt))
    }
}
