use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum CircuitMapError {
    #[error("Data load error: {0}")]
    Load(#[from] LoadError),

    #[error("TUI error: {0}")]
    Tui(#[from] TuiError),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Dataset loading errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV parsing failed in {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    #[error("Missing column '{column}' in {table}")]
    MissingColumn {
        table: &'static str,
        column: &'static str,
    },

    #[error("No rows in {table}")]
    EmptyTable { table: &'static str },

    #[error("Invalid data location: {0}")]
    InvalidLocation(String),
}

/// Per-circuit problems found while resolving a region.
///
/// These never abort a resolution; the affected circuit simply contributes no
/// winner or fastest lap.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveIssue {
    #[error("No result rows for race {race_id} at {circuit}")]
    MissingResult { circuit: String, race_id: String },

    #[error("Unknown driver {driver_id} in race {race_id} at {circuit}")]
    MissingDriver {
        circuit: String,
        race_id: String,
        driver_id: String,
    },
}

/// TUI errors
#[derive(Error, Debug)]
pub enum TuiError {
    #[error("Terminal IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for circuitmap operations
pub type Result<T> = std::result::Result<T, CircuitMapError>;

impl LoadError {
    /// Check if this error is recoverable (a reload may succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LoadError::Http(_) | LoadError::HttpStatus { .. })
    }
}
