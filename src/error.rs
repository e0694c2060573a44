//! Error handling for chart fetching and transform operations.
//!
//! Per-file variants (`MalformedSnapshot`, `TypeCoercion`, `FileTimeout`) are
//! collected by the batch merger; batch-level variants (`DirectoryNotFound`,
//! `EmptyInput`, `NoValidData`) end the invocation with a non-zero exit.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request for top {chart_type} in {country} failed: {source}")]
    Request {
        country: String,
        chart_type: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{var} is not set in environment variables")]
    MissingApiKey { var: String },

    #[error("Malformed snapshot {path}: {reason}")]
    MalformedSnapshot { path: PathBuf, reason: String },

    #[error("Cannot convert column '{column}' to integer in {path} (row {row}, value {value})")]
    TypeCoercion {
        path: PathBuf,
        column: String,
        row: usize,
        value: String,
    },

    #[error("Input directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("No .json files found in {path}")]
    EmptyInput { path: PathBuf },

    #[error("No valid data in {path}: all {failed} files failed to normalize")]
    NoValidData { path: PathBuf, failed: usize },

    #[error("Normalization of {path} did not finish within {seconds}s")]
    FileTimeout { path: PathBuf, seconds: u64 },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Interrupted: {reason}")]
    Interrupted { reason: String },
}

impl ChartError {
    /// Create a malformed snapshot error
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Whether this error only disqualifies a single snapshot file
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            Self::MalformedSnapshot { .. }
                | Self::TypeCoercion { .. }
                | Self::FileTimeout { .. }
                | Self::ProcessingFailed { .. }
                | Self::Io(_)
                | Self::Json(_)
                | Self::Polars(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ChartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_level_errors_are_not_per_file() {
        let path = PathBuf::from("raw/artists");
        assert!(!ChartError::DirectoryNotFound { path: path.clone() }.is_per_file());
        assert!(!ChartError::EmptyInput { path: path.clone() }.is_per_file());
        assert!(!ChartError::NoValidData { path, failed: 3 }.is_per_file());
        assert!(!ChartError::configuration("bad").is_per_file());
        assert!(
            !ChartError::Interrupted {
                reason: "stop".to_string()
            }
            .is_per_file()
        );
    }

    #[test]
    fn test_type_coercion_message_names_column_and_value() {
        let err = ChartError::TypeCoercion {
            path: PathBuf::from("france_2025-01-15_12-00-00.json"),
            column: "artist_listeners".to_string(),
            row: 4,
            value: "lots".to_string(),
        };
        assert!(err.is_per_file());
        let message = err.to_string();
        assert!(message.contains("artist_listeners"));
        assert!(message.contains("lots"));
    }

    #[test]
    fn test_missing_api_key_message() {
        let err = ChartError::MissingApiKey {
            var: "LASTFM_API_KEY".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "LASTFM_API_KEY is not set in environment variables"
        );
    }
}
