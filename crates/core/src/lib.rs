//! # MGSDB Core
//!
//! Transport-agnostic upload orchestration and authentication rules.
//!
//! This crate contains:
//! - Port interfaces (traits) for the upload protocol and login navigation
//! - Part planning, scheduling and progress aggregation
//! - Login redirect target computation
//!
//! ## Architecture Principles
//! - Only depends on `mgsdb-common` and `mgsdb-domain`
//! - No HTTP or filesystem code
//! - All external dependencies via traits

pub mod auth;
pub mod upload;

// Re-export specific items to avoid ambiguity
pub use auth::{is_login_location, login_redirect_target, LoginNavigator};
pub use upload::{
    BytesSource, PartPlan, PartScheduler, PartUpload, ProgressAggregator, SchedulerConfig,
    SentBytes, UploadEngine, UploadHandle, UploadSource, UploadTransport,
};
