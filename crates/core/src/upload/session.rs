//! Upload session negotiation and finalization

use std::sync::Arc;

use mgsdb_domain::{FileReferenceResponse, UploadError};
use tracing::{debug, instrument};

use super::ports::UploadTransport;

/// Opens server-side upload sessions
pub struct SessionNegotiator {
    transport: Arc<dyn UploadTransport>,
}

impl SessionNegotiator {
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self { transport }
    }

    /// Open a session for `total_parts` parts of `file_name`.
    ///
    /// # Errors
    /// Propagates transport errors and returns
    /// `UploadError::NoSessionReturned` when the server answers without a
    /// session identifier.
    #[instrument(skip(self))]
    pub async fn open(&self, file_name: &str, total_parts: u32) -> Result<String, UploadError> {
        let response = self.transport.init_session(file_name, total_parts).await?;
        let session_id = response
            .upload_session
            .filter(|id| !id.is_empty())
            .ok_or(UploadError::NoSessionReturned)?;

        debug!("Upload session opened");
        Ok(session_id)
    }
}

/// A finalized upload: the permanent URL plus the storage key if reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub file_url: String,
    pub key: Option<String>,
}

impl FileReference {
    /// # Errors
    /// Returns `UploadError::MissingFileReference` when `file_url` is absent
    /// or empty.
    pub fn from_response(response: FileReferenceResponse) -> Result<Self, UploadError> {
        let file_url = response
            .file_url
            .filter(|url| !url.is_empty())
            .ok_or(UploadError::MissingFileReference)?;
        Ok(Self { file_url, key: response.key })
    }
}

/// Converts a fully uploaded session into a file reference
pub struct SessionFinalizer {
    transport: Arc<dyn UploadTransport>,
}

impl SessionFinalizer {
    pub fn new(transport: Arc<dyn UploadTransport>) -> Self {
        Self { transport }
    }

    /// # Errors
    /// Propagates transport errors and returns
    /// `UploadError::MissingFileReference` when the server omits the URL.
    #[instrument(skip(self, session_id))]
    pub async fn complete(&self, session_id: &str) -> Result<FileReference, UploadError> {
        let response = self.transport.complete_session(session_id).await?;
        FileReference::from_response(response)
    }
}
