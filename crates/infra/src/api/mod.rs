//! Backend API access for MGSDB
//!
//! Authenticated calls to the MGSDB backend: credential exchange and
//! refresh, the refresh-once call executor, URL resolution and response
//! envelopes.
//!
//! # Architecture
//!
//! - Uses the shared `HttpClient` (no direct reqwest clients)
//! - One refresh per rejected call, coalesced across concurrent callers
//! - Redirects and failed refreshes send the session to the login page
//! - Timeout on every call

pub mod auth;
pub mod client;
pub mod envelope;
pub mod errors;
pub mod request;
pub mod url;

pub use auth::{AccessTokenProvider, AuthService};
pub use client::{ApiClient, ApiClientBuilder, ApiClientConfig};
pub use envelope::unwrap_envelope;
pub use errors::{ApiError, ApiErrorCategory};
pub use request::{ApiRequest, ErrorMode, FormField, RequestBody};
pub use url::resolve_api_url;
