//! Application constants for the chart processor
//!
//! Endpoint defaults, filesystem layout, timestamp formats and the default
//! country list used by the ingestion run.

// =============================================================================
// Chart API
// =============================================================================

/// Base URL of the chart API
pub const DEFAULT_BASE_URL: &str = "https://ws.audioscrobbler.com/2.0/";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "LASTFM_API_KEY";

/// Optional environment override for the base URL
pub const BASE_URL_ENV: &str = "LASTFM_BASE_URL";

/// Prefix of the chart method name; the chart type is appended
pub const CHART_METHOD_PREFIX: &str = "geo.gettop";

/// HTTP timeout for a single chart request
pub const REQUEST_TIMEOUT_SECS: u64 = 100;

/// Items requested per page
pub const DEFAULT_LIMIT: u32 = 50;

/// Page requested by default
pub const DEFAULT_PAGE: u32 = 1;

/// Pause after each request in seconds
pub const DEFAULT_REQUEST_DELAY_SECS: f64 = 1.5;

// =============================================================================
// Filesystem layout
// =============================================================================

/// Root of raw snapshots, partitioned by chart type below it
pub const DEFAULT_DATA_ROOT: &str = "data/raw/geo";

/// Root under which `silver/geo/{type}` outputs are written
pub const DEFAULT_OUTPUT_ROOT: &str = "data";

/// Path segments between the output root and the chart type directory
pub const SILVER_SEGMENTS: &[&str] = &["silver", "geo"];

/// Glob pattern for raw snapshot files
pub const SNAPSHOT_PATTERN: &str = "*.json";

/// Timestamp embedded in raw snapshot file names
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Date segment of a snapshot file name
pub const SNAPSHOT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp embedded in combined output file names
pub const OUTPUT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// =============================================================================
// Scheduling
// =============================================================================

/// Interval between scheduled ingestion runs
pub const DEFAULT_SCHEDULE_INTERVAL_HOURS: u64 = 24;

/// Longest accepted interval (one year)
pub const MAX_SCHEDULE_INTERVAL_HOURS: u64 = 24 * 366;

/// Countries pulled by a full ingestion run
pub const DEFAULT_COUNTRIES: &[&str] = &[
    "United States",
    "United Kingdom",
    "Canada",
    "Australia",
    "Germany",
    "France",
    "Spain",
    "Brazil",
    "Mexico",
    "Japan",
];

// =============================================================================
// Canonical columns
// =============================================================================

/// Metadata columns stamped on every canonical row
pub mod columns {
    pub const RANK: &str = "rank";
    pub const CHART_COUNTRY: &str = "chart_country";
    pub const CHART_DATE: &str = "chart_date";
    pub const LOAD_TIME: &str = "load_time";
    pub const DATE_INFERRED: &str = "date_inferred";

    /// Raw field dropped from every chart item
    pub const IMAGE: &str = "image";
}
