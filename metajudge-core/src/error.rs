//! Error types for metajudge-core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the metajudge-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error while reading or writing a tabular file
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A required input file does not exist
    #[error("{kind} file not found: {}", path.display())]
    MissingFile { kind: &'static str, path: PathBuf },

    /// The insights file has no rows to review
    #[error("insights file has no rows: {}", .0.display())]
    EmptyDataset(PathBuf),

    /// Save file exists but is not a metajudge save
    #[error("invalid save file {}: {message}", path.display())]
    InvalidSaveFile { path: PathBuf, message: String },

    /// User input out of range or unparseable
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Export requested before any review was completed
    #[error("no reviews completed yet; complete some reviews before exporting")]
    NothingToExport,
}

impl Error {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Error::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for metajudge-core
pub type Result<T> = std::result::Result<T, Error>;
