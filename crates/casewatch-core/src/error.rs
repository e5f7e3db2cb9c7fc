use std::path::PathBuf;
use thiserror::Error;

use crate::models::Category;

/// All errors produced by the CaseWatch crates.
#[derive(Error, Debug)]
pub enum CaseWatchError {
    /// The observation date on a snapshot row is not in `M/D/YY` form.
    #[error("Invalid observation date \"{0}\": expected M/D/YY")]
    DateFormat(String),

    /// A count field could not be coerced to a non-negative integer.
    #[error("Invalid count \"{value}\" for region {region}")]
    InvalidCount { region: String, value: String },

    /// A required snapshot table has zero rows.
    #[error("Snapshot table for {0} has no rows")]
    EmptySource(Category),

    /// A table file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the CaseWatch crates.
pub type Result<T> = std::result::Result<T, CaseWatchError>;
