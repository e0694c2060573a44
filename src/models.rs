//! Core data structures and types for chart processing.
//!
//! Defines the chart types, their per-type envelope and field maps,
//! and the statistics reported by merge runs.

use crate::constants::{CHART_METHOD_PREFIX, columns};
use crate::error::ChartError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// One raw chart item as returned by the API
pub type ChartItem = serde_json::Map<String, serde_json::Value>;

/// Chart types offered by the geo endpoints
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Artists,
    Tracks,
}

impl ChartType {
    pub const ALL: [ChartType; 2] = [ChartType::Artists, ChartType::Tracks];

    /// Lowercase name used in method names and directory names
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Artists => "artists",
            ChartType::Tracks => "tracks",
        }
    }

    /// API method name, e.g. `geo.gettopartists`
    pub fn method(&self) -> String {
        format!("{}{}", CHART_METHOD_PREFIX, self.as_str())
    }

    /// Object key and list key holding the chart items
    pub fn envelope_path(&self) -> (&'static str, &'static str) {
        match self {
            ChartType::Artists => ("topartists", "artist"),
            ChartType::Tracks => ("tracks", "track"),
        }
    }

    /// Flattened raw column name to canonical column name
    pub fn field_map(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            ChartType::Artists => &[
                ("@attr.rank", columns::RANK),
                ("name", "artist_name"),
                ("mbid", "artist_mbid"),
                ("listeners", "artist_listeners"),
                ("url", "artist_url"),
            ],
            ChartType::Tracks => &[
                ("@attr.rank", columns::RANK),
                ("name", "track_name"),
                ("duration", "track_duration"),
                ("listeners", "track_listeners"),
                ("mbid", "track_mbid"),
                ("url", "track_url"),
                ("artist.name", "artist_name"),
                ("artist.mbid", "artist_mbid"),
                ("artist.url", "artist_url"),
            ],
        }
    }

    /// Canonical listener count column
    pub fn listeners_column(&self) -> &'static str {
        match self {
            ChartType::Artists => "artist_listeners",
            ChartType::Tracks => "track_listeners",
        }
    }

    /// Columns that must convert to Int64
    pub fn integer_columns(&self) -> [&'static str; 2] {
        [columns::RANK, self.listeners_column()]
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "artists" => Ok(ChartType::Artists),
            "tracks" => Ok(ChartType::Tracks),
            other => Err(ChartError::configuration(format!(
                "unknown chart type '{}' (expected 'artists' or 'tracks')",
                other
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TopArtistsEnvelope {
    topartists: ArtistList,
}

#[derive(Debug, Deserialize)]
struct ArtistList {
    artist: Vec<ChartItem>,
}

#[derive(Debug, Deserialize)]
struct TopTracksEnvelope {
    tracks: TrackList,
}

#[derive(Debug, Deserialize)]
struct TrackList {
    track: Vec<ChartItem>,
}

/// Chart items extracted from a validated response body
#[derive(Debug, Clone)]
pub enum ChartPayload {
    Artists(Vec<ChartItem>),
    Tracks(Vec<ChartItem>),
}

impl ChartPayload {
    /// Parse a snapshot body against the envelope of `chart_type`.
    ///
    /// Fails when the text is not JSON, when the envelope keys are missing,
    /// or when an item is not an object.
    pub fn parse(chart_type: ChartType, text: &str) -> serde_json::Result<Self> {
        match chart_type {
            ChartType::Artists => {
                let envelope: TopArtistsEnvelope = serde_json::from_str(text)?;
                Ok(ChartPayload::Artists(envelope.topartists.artist))
            }
            ChartType::Tracks => {
                let envelope: TopTracksEnvelope = serde_json::from_str(text)?;
                Ok(ChartPayload::Tracks(envelope.tracks.track))
            }
        }
    }

    pub fn items(&self) -> &[ChartItem] {
        match self {
            ChartPayload::Artists(items) | ChartPayload::Tracks(items) => items,
        }
    }
}

/// Merge run statistics
#[derive(Debug, Default, Clone)]
pub struct MergeStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_rows: usize,
    pub total_columns: usize,
    pub output_path: PathBuf,
    pub processing_time_ms: u128,
}
