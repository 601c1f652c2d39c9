//! # MGSDB Domain
//!
//! Shared types for the MGSDB transport and upload client.
//!
//! This crate contains:
//! - Error types and the `Result` alias
//! - Configuration structures
//! - Endpoint paths, storage keys and transfer defaults
//! - Authentication and upload payloads
//!
//! ## Architecture
//! - No dependencies on other MGSDB crates
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
