//! Common building blocks shared across MGSDB crates.
//!
//! # Modules
//!
//! - `auth`: credential store, JWT expiry inspection, session storage
//! - `resilience`: backoff strategies and jitter
//! - `testing`: mocks and fixtures (`test-utils` feature)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod resilience;

// Testing utilities
// ---------------------------------------------------------------
#[cfg(any(feature = "test-utils", test))]
pub mod testing;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use auth::{CredentialStore, FileSessionStorage, MemorySessionStorage, SessionStorage};
pub use resilience::{Backoff, BackoffStrategy, Jitter};
