//! # MGSDB Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The shared HTTP client with 5xx/connection retry
//! - Authentication against the MGSDB token endpoints
//! - The authenticated call executor (refresh once, then redirect to login)
//! - The HTTP upload transport and file-backed upload sources
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `mgsdb-core`
//! - Depends on `mgsdb-common`, `mgsdb-domain` and `mgsdb-core`
//! - Contains all "impure" code (network and filesystem I/O)

pub mod api;
pub mod config;
pub mod errors;
pub mod http;
pub mod navigation;
pub mod upload;

// Re-export commonly used items
pub use api::{AccessTokenProvider, ApiClient, ApiClientConfig, ApiError, AuthService};
pub use errors::InfraError;
pub use http::HttpClient;
pub use navigation::SessionNavigator;
pub use upload::{FileSource, HttpUploadTransport};
