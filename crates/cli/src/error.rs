//! Errors surfaced by CLI commands

use mgsdb_common::auth::StorageError;
use mgsdb_domain::{MgsdbError, UploadError};
use mgsdb_infra::api::{ApiError, ApiErrorCategory};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] MgsdbError),

    #[error("session storage: {0}")]
    Session(#[from] StorageError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("not logged in; run `mgsdb-upload login` first")]
    NotLoggedIn,

    #[error("failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// `2` asks the user to sign in again, `130` follows the shell
    /// convention for an interrupted command.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::NotLoggedIn | Self::Upload(UploadError::AuthRequired(_)) => 2,
            Self::Api(err) if err.category() == ApiErrorCategory::Authentication => 2,
            Self::Upload(UploadError::Cancelled) => 130,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::NotLoggedIn.exit_code(), 2);
        assert_eq!(CliError::Api(ApiError::LoginRequired).exit_code(), 2);
        assert_eq!(CliError::Upload(UploadError::Cancelled).exit_code(), 130);
        assert_eq!(CliError::Upload(UploadError::NoSessionReturned).exit_code(), 1);
    }
}
