//! Testing utilities and helpers
//!
//! - **[`async_utils`]**: polling helpers that respect tokio's paused clock
//! - **[`fixtures`]**: JWT builders with controllable expiry
//! - **[`mocks`]**: session storage with failure injection
//!
//! Enabled for downstream crates through the `test-utils` feature.

pub mod async_utils;
pub mod fixtures;
pub mod mocks;

pub use async_utils::poll_until;
pub use fixtures::{token_expiring_in, unsigned_jwt};
pub use mocks::MockSessionStorage;
