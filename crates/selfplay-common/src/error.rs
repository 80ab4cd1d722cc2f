//! Error types shared by the selfplay crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, SelfplayError>;

/// Main error type for shared utilities
#[derive(Error, Debug)]
pub enum SelfplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("Invalid gzip payload: {0}")]
    InvalidGzip(String),

    #[error("Invalid match result: {0} (expected -1, 0 or 1)")]
    InvalidResult(i64),

    #[error("Protocol error: {0}")]
    Protocol(String),
}
