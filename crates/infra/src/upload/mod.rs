//! Upload protocol adapters
//!
//! - [`transport`]: the four upload calls over the authenticated executor
//! - [`source`]: file-backed upload content

pub mod source;
pub mod transport;

pub use source::FileSource;
pub use transport::HttpUploadTransport;
