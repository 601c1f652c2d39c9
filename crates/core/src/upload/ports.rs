//! Port interfaces for the upload engine

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;
use mgsdb_domain::{
    FileReferenceResponse, InitMultipartResponse, PartUploadResponse, UploadError,
};

/// Running count of request body bytes handed to the network
///
/// Restarts from zero when a call is re-sent, so readers keep their own
/// maximum.
pub type SentBytes = watch::Sender<u64>;

/// One part call of a multi-part upload
#[derive(Debug, Clone)]
pub struct PartUpload {
    pub session_id: String,
    pub part_number: u32,
    pub total_parts: u32,
    pub file_name: String,
    pub content: Bytes,
}

/// Trait for the server side of the upload protocol
///
/// Implementations report raw responses; the engine decides what a missing
/// field means. Errors must be classified through
/// [`UploadError::is_retryable`] so the scheduler knows whether to requeue.
#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Upload a whole file in one call (used below the part-size threshold),
    /// reporting body bytes through `sent` while the request is written.
    async fn upload_direct(
        &self,
        file_name: &str,
        content: Bytes,
        sent: SentBytes,
    ) -> Result<FileReferenceResponse, UploadError>;

    /// Open a server-side session for `total_parts` parts.
    async fn init_session(
        &self,
        file_name: &str,
        total_parts: u32,
    ) -> Result<InitMultipartResponse, UploadError>;

    async fn upload_part(&self, part: PartUpload) -> Result<PartUploadResponse, UploadError>;

    /// Close the session and obtain the permanent file reference.
    async fn complete_session(
        &self,
        session_id: &str,
    ) -> Result<FileReferenceResponse, UploadError>;
}

/// Trait for random-access upload content
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Name announced to the server
    fn file_name(&self) -> &str;

    /// Total size in bytes
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read exactly the bytes in `range`.
    async fn read_range(&self, range: Range<u64>) -> Result<Bytes, UploadError>;
}
