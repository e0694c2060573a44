//! Transform engine for raw chart snapshots.
//!
//! Orchestrates the batch workflow: discover snapshots in one directory,
//! normalize each file on the blocking pool, union the results by column
//! name and write a single Parquet dataset.

pub mod discovery;
pub mod filename;
pub mod flatten;
pub mod normalizer;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::{discovery::SnapshotDiscovery, normalizer::RecordNormalizer, writer::ParquetWriter};

use crate::config::{ChartConfig, CompressionAlgorithm};
use crate::error::{ChartError, Result};
use crate::models::{ChartType, MergeStats};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::{DataFrame, IntoLazy, UnionArgs, concat_lf_diagonal};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, error, info};

/// A snapshot that could not be normalized
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ChartError,
}

/// Result of a successful merge
#[derive(Debug)]
pub struct MergeOutcome {
    pub output_path: PathBuf,
    pub dataset: DataFrame,
    pub failures: Vec<FileFailure>,
    pub stats: MergeStats,
}

/// Merges every snapshot of one chart type into one dataset
#[derive(Debug, Clone)]
pub struct BatchMerger {
    normalizer: RecordNormalizer,
    compression: CompressionAlgorithm,
    file_timeout: Option<Duration>,
    show_progress: bool,
}

impl BatchMerger {
    pub fn new(chart_type: ChartType, config: &ChartConfig) -> Self {
        Self {
            normalizer: RecordNormalizer::new(chart_type),
            compression: config.compression,
            file_timeout: config.file_timeout(),
            show_progress: true,
        }
    }

    /// Print the banner, progress bar and summary to stdout
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn chart_type(&self) -> ChartType {
        self.normalizer.chart_type()
    }

    /// Merge all `*.json` snapshots in `input_dir` below `output_root`.
    ///
    /// Per-file failures are logged and returned in the outcome. The call
    /// itself fails when the directory is missing, holds no snapshots, no
    /// snapshot normalizes, or an error is not confined to a single file;
    /// nothing is written in those cases.
    pub async fn merge_directory(
        &self,
        input_dir: &Path,
        output_root: &Path,
    ) -> Result<MergeOutcome> {
        let start_time = Instant::now();
        let chart_type = self.chart_type();

        if self.show_progress {
            println!(
                "{}",
                format!("Transforming top {} snapshots", chart_type)
                    .bright_green()
                    .bold()
            );
            println!("  {} {}", "Input:".bright_cyan(), input_dir.display());
        }

        let files = SnapshotDiscovery::new(input_dir).discover()?;
        if files.is_empty() {
            return Err(ChartError::EmptyInput {
                path: input_dir.to_path_buf(),
            });
        }
        if self.show_progress {
            println!(
                "  {} {} JSON files",
                "Found".bright_green(),
                files.len().to_string().bright_white().bold()
            );
        }

        let (frames, failures) = self.normalize_all(&files).await?;
        if frames.is_empty() {
            return Err(ChartError::NoValidData {
                path: input_dir.to_path_buf(),
                failed: failures.len(),
            });
        }

        debug!("Combining {} normalized frames", frames.len());
        let lazy_frames: Vec<_> = frames.into_iter().map(|df| df.lazy()).collect();
        let dataset = concat_lf_diagonal(lazy_frames, UnionArgs::default())?.collect()?;

        let writer = ParquetWriter::new(output_root, self.compression);
        let (dataset, output_path) = task::spawn_blocking(move || {
            let mut dataset = dataset;
            let path = writer.write(&mut dataset, chart_type)?;
            Ok::<_, ChartError>((dataset, path))
        })
        .await
        .map_err(|e| ChartError::ProcessingFailed {
            path: output_root.to_path_buf(),
            reason: format!("Parquet write task failed: {}", e),
        })??;

        let (rows, columns) = dataset.shape();
        info!(
            "Saved combined {} dataset ({} rows x {} columns) → {}",
            chart_type,
            rows,
            columns,
            output_path.display()
        );

        let stats = MergeStats {
            files_found: files.len(),
            files_processed: files.len() - failures.len(),
            files_failed: failures.len(),
            total_rows: rows,
            total_columns: columns,
            output_path: output_path.clone(),
            processing_time_ms: start_time.elapsed().as_millis(),
        };
        if self.show_progress {
            print_summary(&stats);
        }

        Ok(MergeOutcome {
            output_path,
            dataset,
            failures,
            stats,
        })
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }

    /// Normalize files one at a time, in order
    async fn normalize_all(
        &self,
        files: &[PathBuf],
    ) -> Result<(Vec<DataFrame>, Vec<FileFailure>)> {
        let pb = self.progress_bar(files.len());

        let mut frames = Vec::with_capacity(files.len());
        let mut failures = Vec::new();

        for file_path in files {
            if let Some(file_name) = file_path.file_name() {
                pb.set_message(format!("Processing: {}", file_name.to_string_lossy()));
            }

            let result = self.normalize_file(file_path).await;
            if let Err(e) = record_result(file_path, result, &mut frames, &mut failures) {
                pb.abandon_with_message("Aborted");
                return Err(e);
            }
            pb.inc(1);
        }

        pb.finish_with_message("All JSON files processed");
        Ok((frames, failures))
    }

    async fn normalize_file(&self, file_path: &Path) -> Result<DataFrame> {
        let normalizer = self.normalizer;
        let path = file_path.to_path_buf();
        let handle = task::spawn_blocking(move || normalizer.normalize(&path));

        let joined = match self.file_timeout {
            Some(limit) => tokio::time::timeout(limit, handle).await.map_err(|_| {
                ChartError::FileTimeout {
                    path: file_path.to_path_buf(),
                    seconds: limit.as_secs(),
                }
            })?,
            None => handle.await,
        };

        joined.map_err(|e| ChartError::ProcessingFailed {
            path: file_path.to_path_buf(),
            reason: format!("Normalization task failed: {}", e),
        })?
    }
}

/// Keep a frame or record a per-file failure; any other error aborts the batch
fn record_result(
    file_path: &Path,
    result: Result<DataFrame>,
    frames: &mut Vec<DataFrame>,
    failures: &mut Vec<FileFailure>,
) -> Result<()> {
    match result {
        Ok(df) => {
            debug!(
                "Successfully processed: {} ({} rows)",
                file_path.display(),
                df.height()
            );
            frames.push(df);
        }
        Err(e) if e.is_per_file() => {
            error!("Failed to process {}: {:#}", file_path.display(), e);
            failures.push(FileFailure {
                path: file_path.to_path_buf(),
                error: e,
            });
        }
        Err(e) => return Err(e),
    }
    Ok(())
}

fn print_summary(stats: &MergeStats) {
    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files found:".bright_cyan(),
        stats.files_found.to_string().bright_white()
    );
    println!(
        "  {} {}",
        "Files processed:".bright_cyan(),
        stats.files_processed.to_string().bright_white()
    );
    if stats.files_failed > 0 {
        println!(
            "  {} {}",
            "Files failed:".bright_red(),
            stats.files_failed.to_string().bright_red().bold()
        );
    }
    println!(
        "  {} {} rows x {} columns",
        "Combined shape:".bright_cyan(),
        stats.total_rows.to_string().bright_white().bold(),
        stats.total_columns.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        stats.output_path.display()
    );
}
