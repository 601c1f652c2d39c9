//! API-specific error types
//!
//! Provides error classification for API operations with retry metadata.

use std::time::Duration;

use mgsdb_domain::{MgsdbError, UploadError};
use thiserror::Error;

/// Categories of API errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Credentials missing, rejected or unrefreshable - needs a new login
    Authentication,
    /// Rate limiting errors (429) - retry with backoff
    RateLimit,
    /// Server errors (5xx) - retryable
    Server,
    /// Client errors (4xx except auth) and business failures - non-retryable
    Client,
    /// Network/connection errors and timeouts - retryable
    Network,
    /// Unexpected response shapes - non-retryable
    Protocol,
    /// Configuration errors - non-retryable
    Config,
}

/// API operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// A 401 that survived the refresh-and-retry, or rejected login credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),

    /// The refresh response carried no access token
    #[error("NO_ACCESS_TOKEN")]
    NoAccessToken,

    /// The backend answered with a redirect; the session must log in again
    #[error("Login required")]
    LoginRequired,

    /// A refresh was attempted while an explicit logout was in progress
    #[error("Logged out")]
    LoggedOut,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// A 2xx envelope whose `status` field is non-zero
    #[error("Request rejected (status {status}): {message}")]
    Business { status: i64, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized(_)
            | Self::RefreshFailed(_)
            | Self::NoAccessToken
            | Self::LoginRequired
            | Self::LoggedOut => ApiErrorCategory::Authentication,
            Self::Status { status, .. } => match status {
                401 | 403 => ApiErrorCategory::Authentication,
                408 => ApiErrorCategory::Network,
                429 => ApiErrorCategory::RateLimit,
                500..=599 => ApiErrorCategory::Server,
                _ => ApiErrorCategory::Client,
            },
            Self::Business { .. } => ApiErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) => ApiErrorCategory::Network,
            Self::Decode(_) => ApiErrorCategory::Protocol,
            Self::Config(_) => ApiErrorCategory::Config,
        }
    }

    /// Check if this error should be retried
    ///
    /// Authentication failures are not: the executor has already spent its
    /// one refresh by the time they surface.
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            ApiErrorCategory::RateLimit | ApiErrorCategory::Server | ApiErrorCategory::Network
        )
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<MgsdbError> for ApiError {
    fn from(err: MgsdbError) -> Self {
        match err {
            MgsdbError::Network(message) | MgsdbError::Timeout(message) => Self::Network(message),
            MgsdbError::Auth(message) => Self::Unauthorized(message),
            MgsdbError::Config(message)
            | MgsdbError::Storage(message)
            | MgsdbError::InvalidInput(message)
            | MgsdbError::Internal(message) => Self::Config(message),
        }
    }
}

impl From<ApiError> for UploadError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Timeout(limit) => UploadError::Timeout(limit),
            err if err.category() == ApiErrorCategory::Authentication => {
                UploadError::AuthRequired(err.to_string())
            }
            err => {
                UploadError::Transport { retryable: err.should_retry(), message: err.to_string() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status { status: code, message: "test".into() }
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(status(401).category(), ApiErrorCategory::Authentication);
        assert_eq!(status(403).category(), ApiErrorCategory::Authentication);
        assert_eq!(status(429).category(), ApiErrorCategory::RateLimit);
        assert_eq!(status(503).category(), ApiErrorCategory::Server);
        assert_eq!(status(422).category(), ApiErrorCategory::Client);
        assert_eq!(ApiError::LoggedOut.category(), ApiErrorCategory::Authentication);
        assert_eq!(
            ApiError::Network("reset".to_string()).category(),
            ApiErrorCategory::Network
        );
    }

    #[test]
    fn test_should_retry() {
        assert!(status(429).should_retry());
        assert!(status(500).should_retry());
        assert!(status(408).should_retry());
        assert!(ApiError::Network("test".to_string()).should_retry());
        assert!(ApiError::Timeout(Duration::from_secs(1)).should_retry());
        assert!(!status(400).should_retry());
        assert!(!status(401).should_retry());
        assert!(!ApiError::Business { status: 1, message: "dup".into() }.should_retry());
        assert!(!ApiError::Decode("bad json".into()).should_retry());
    }

    #[test]
    fn test_upload_error_conversion() {
        assert!(UploadError::from(status(502)).is_retryable());
        assert!(!UploadError::from(status(404)).is_retryable());
        assert!(matches!(
            UploadError::from(ApiError::RefreshFailed("x".into())),
            UploadError::AuthRequired(_)
        ));
        assert_eq!(
            UploadError::from(ApiError::Timeout(Duration::from_secs(3))),
            UploadError::Timeout(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_no_access_token_message() {
        assert_eq!(ApiError::NoAccessToken.to_string(), "NO_ACCESS_TOKEN");
    }
}
