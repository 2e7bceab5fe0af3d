//! Error types for the reference table engine.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source listing could not be fetched or parsed
    #[error("Config load error: {0}")]
    ConfigLoad(String),

    /// Content for one source id could not be fetched
    #[error("Failed to fetch source '{id}': {reason}")]
    SourceFetch { id: String, reason: String },

    /// Raw text had no header line
    #[error("Parse error: {0}")]
    Parse(String),

    /// Query against a source id that is not registered
    #[error("Source not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn fetch(id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Error::SourceFetch {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}
