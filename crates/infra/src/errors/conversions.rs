//! Mapping of third-party failures onto [`MgsdbError`]
//!
//! `reqwest` and session storage errors cannot implement foreign traits on
//! the domain type directly, so they pass through [`InfraError`].

use mgsdb_common::auth::StorageError;
use mgsdb_domain::MgsdbError;

/// Newtype carrying a domain error out of infrastructure code
#[derive(Debug)]
pub struct InfraError(pub MgsdbError);

impl From<InfraError> for MgsdbError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MgsdbError> for InfraError {
    fn from(value: MgsdbError) -> Self {
        InfraError(value)
    }
}

impl From<reqwest::Error> for InfraError {
    fn from(err: reqwest::Error) -> Self {
        let mapped = if err.is_timeout() {
            MgsdbError::Timeout("HTTP request timed out".into())
        } else if err.is_connect() {
            MgsdbError::Network(format!("HTTP connection failure: {err}"))
        } else if err.is_builder() {
            MgsdbError::InvalidInput(format!("invalid HTTP request: {err}"))
        } else if let Some(status) = err.status() {
            let reason = status.canonical_reason().unwrap_or("unknown status");
            let message = format!("HTTP {} {reason}", status.as_u16());
            match status.as_u16() {
                401 | 403 => MgsdbError::Auth(message),
                400..=499 => MgsdbError::InvalidInput(message),
                _ => MgsdbError::Network(message),
            }
        } else {
            MgsdbError::Network(format!("HTTP request failed: {err}"))
        };
        InfraError(mapped)
    }
}

impl From<StorageError> for InfraError {
    fn from(err: StorageError) -> Self {
        InfraError(MgsdbError::Storage(err.to_string()))
    }
}
