//! Snapshot discovery
//!
//! Lists the `*.json` files directly inside a chart directory in
//! lexicographic order. With `{country}_{date}_{time}.json` names this
//! groups by country and then by fetch time.

use crate::constants::SNAPSHOT_PATTERN;
use crate::error::{ChartError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File discovery for one directory of raw snapshots
#[derive(Debug)]
pub struct SnapshotDiscovery {
    input_dir: PathBuf,
}

impl SnapshotDiscovery {
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
        }
    }

    /// Discover snapshot files, sorted by name.
    ///
    /// Fails with `DirectoryNotFound` when the directory is missing; an
    /// empty result is returned as-is for the caller to judge.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        if !self.input_dir.is_dir() {
            return Err(ChartError::DirectoryNotFound {
                path: self.input_dir.clone(),
            });
        }

        let escaped_dir = glob::Pattern::escape(&self.input_dir.to_string_lossy());
        let pattern = Path::new(&escaped_dir).join(SNAPSHOT_PATTERN);
        let pattern_str = pattern.to_string_lossy();
        debug!("Searching for snapshots with pattern: {}", pattern_str);

        let entries = glob::glob(&pattern_str)
            .map_err(|e| ChartError::configuration(format!("Invalid glob pattern: {}", e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ChartError::Io(e.into_error()))?;
            if path.is_file() {
                files.push(path);
            }
        }

        files.sort();
        debug!(
            "Found {} snapshot files in {}",
            files.len(),
            self.input_dir.display()
        );
        Ok(files)
    }
}
