//! Chunked upload engine
//!
//! - [`plan`]: split a file into numbered byte ranges
//! - [`session`]: open and finalize server-side upload sessions
//! - [`scheduler`]: bounded-concurrency part uploads with requeue on failure
//! - [`progress`]: byte-level progress published over a `watch` channel
//! - [`engine`]: direct vs. multi-part orchestration and background handles

pub mod engine;
pub mod plan;
pub mod ports;
pub mod progress;
pub mod scheduler;
pub mod session;
pub mod source;

pub use engine::{UploadEngine, UploadHandle};
pub use plan::{PartPlan, PartTask};
pub use ports::{PartUpload, SentBytes, UploadSource, UploadTransport};
pub use progress::ProgressAggregator;
pub use scheduler::{PartScheduler, SchedulerConfig};
pub use session::{FileReference, SessionFinalizer, SessionNegotiator};
pub use source::BytesSource;
