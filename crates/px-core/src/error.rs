//! Error types for pixband

use thiserror::Error;

/// pixband error type
#[derive(Error, Debug)]
pub enum Error {
    /// A requested series or container path is absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed axis or pile-up range bounds.
    #[error("invalid range: [{min}, {max}]")]
    InvalidRange {
        /// Lower bound as supplied by the caller.
        min: f64,
        /// Upper bound as supplied by the caller.
        max: f64,
    },

    /// Mismatched lengths, bad bin indices, unparseable patterns.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A module name lacks the numeric id a grouping operation requires.
    #[error("malformed module id: {0}")]
    MalformedId(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
