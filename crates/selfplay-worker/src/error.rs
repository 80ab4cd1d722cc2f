//! Error types for the selfplay worker
//!
//! Every variant is recoverable from the orchestrator's point of view: a
//! failed cycle goes through backoff and the worker asks for new work.

use selfplay_common::SelfplayError;
use thiserror::Error;

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

#[derive(Error, Debug)]
pub enum WorkerError {
    /// The coordinator answered with a non-success status
    #[error("Coordinator returned {status}: {message}")]
    Api { status: u16, message: String },

    /// HTTP transport failed before a response arrived
    #[error("Network request failed: {0}. Check the coordinator URL and connectivity.")]
    Http(#[from] reqwest::Error),

    /// Downloaded network does not hash to the requested sha
    #[error("Checksum verification failed for network '{expected}': got '{actual}'")]
    ChecksumMismatch { expected: String, actual: String },

    /// Engine could not be spawned, exited abnormally, or went silent
    #[error("Engine process failed: {0}")]
    Process(String),

    /// Engine or coordinator spoke something we could not understand
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("File operation failed: {0}. Check permissions and disk space in the work directory.")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Shutdown requested")]
    Cancelled,

    #[error(transparent)]
    Common(SelfplayError),
}

impl WorkerError {
    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an engine process error
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a checksum mismatch error
    /// Whether the error came from shutdown rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled)
    }
}

impl From<SelfplayError> for WorkerError {
    fn from(err: SelfplayError) -> Self {
        match err {
            SelfplayError::ChecksumMismatch { expected, actual } => {
                WorkerError::ChecksumMismatch { expected, actual }
            },
            SelfplayError::Io(e) => WorkerError::Io(e),
            other => WorkerError::Common(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_mismatch_is_lifted_from_common() {
        let err: WorkerError = SelfplayError::ChecksumMismatch {
            expected: "abcd".to_string(),
            actual: "efgh".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            WorkerError::ChecksumMismatch { ref expected, ref actual } if expected == "abcd" && actual == "efgh"
        ));
    }

    #[test]
    fn test_api_error_message() {
        let err = WorkerError::api(404, "No active training run");
        assert_eq!(err.to_string(), "Coordinator returned 404: No active training run");
        assert!(!err.is_cancelled());
        assert!(WorkerError::Cancelled.is_cancelled());
    }
}
