//! Chart retrieval and raw snapshot persistence.
//!
//! [`client::ChartClient`] issues one GET per (country, chart type, page);
//! [`snapshot::SnapshotWriter`] stores the untouched response body under the
//! raw data root. The ingestion run depends on the [`ChartSource`] trait
//! rather than the HTTP client so it can be driven by fakes.

pub mod client;
pub mod snapshot;

pub use client::ChartClient;
pub use snapshot::SnapshotWriter;

use crate::error::Result;
use crate::models::ChartType;
use std::future::Future;

/// Anything that can produce a chart response body
pub trait ChartSource {
    fn fetch(
        &self,
        country: &str,
        chart_type: ChartType,
        limit: u32,
        page: u32,
    ) -> impl Future<Output = Result<serde_json::Value>> + Send;
}
