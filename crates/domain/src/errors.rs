//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MGSDB client operations
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MgsdbError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for MGSDB operations
pub type Result<T> = std::result::Result<T, MgsdbError>;

/// Failures of a file upload, direct or multi-part.
///
/// Transient failures (`Transport` with `retryable`, `Timeout`) are absorbed
/// by the part scheduler; everything else ends the upload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    #[error("server did not return an upload session")]
    NoSessionReturned,

    #[error("server did not return a file reference")]
    MissingFileReference,

    #[error("authentication required: {0}")]
    AuthRequired(String),

    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upload cancelled")]
    Cancelled,

    #[error("part {part_number} failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { part_number: u32, attempts: u32, last_error: String },

    #[error("failed to read upload source: {0}")]
    Source(String),

    #[error("invalid upload request: {0}")]
    InvalidInput(String),
}

impl UploadError {
    /// Shorthand for a transport failure that may be retried.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), retryable: true }
    }

    /// Shorthand for a transport failure that must not be retried.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into(), retryable: false }
    }

    /// Whether a part that failed with this error goes back on the queue.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { retryable, .. } => *retryable,
            Self::Timeout(_) => true,
            Self::NoSessionReturned
            | Self::MissingFileReference
            | Self::AuthRequired(_)
            | Self::Cancelled
            | Self::RetriesExhausted { .. }
            | Self::Source(_)
            | Self::InvalidInput(_) => false,
        }
    }
}

impl From<MgsdbError> for UploadError {
    fn from(err: MgsdbError) -> Self {
        match err {
            MgsdbError::Network(message) => Self::transient(message),
            MgsdbError::Timeout(message) => Self::transient(message),
            MgsdbError::Auth(message) => Self::AuthRequired(message),
            MgsdbError::Storage(message) => Self::Source(message),
            MgsdbError::InvalidInput(message) => Self::InvalidInput(message),
            MgsdbError::Config(message) | MgsdbError::Internal(message) => Self::fatal(message),
        }
    }
}
