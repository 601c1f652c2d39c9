//! Resilience patterns for transient failures
//!
//! - **Backoff**: delay calculation with exponential growth and jitter, used
//!   between requeued part attempts and between HTTP retries.

pub mod retry;

pub use retry::{Backoff, BackoffStrategy, Jitter};
