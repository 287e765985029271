//! Error types for cclog-core

use thiserror::Error;

/// Main error type for the cclog-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error (unreadable or missing log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (a log line that is not a valid record)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for cclog-core
pub type Result<T> = std::result::Result<T, Error>;
