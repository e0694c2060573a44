//! Chart Processor Library
//!
//! Fetches country-level top artist and top track charts from the Last.fm
//! API, stores each response as an immutable JSON snapshot, and flattens
//! directories of snapshots into combined Parquet datasets.
//!
//! This library provides tools for:
//! - Issuing chart requests and persisting raw snapshots ([`fetch`])
//! - Sequential multi-country ingestion and its periodic trigger ([`ingest`])
//! - Normalizing snapshots into canonical rows and merging them ([`processor`])

pub mod config;
pub mod constants;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod models;
pub mod processor;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use config::ChartConfig;
pub use error::{ChartError, Result};
pub use models::{ChartPayload, ChartType, MergeStats};
pub use processor::{BatchMerger, MergeOutcome};
