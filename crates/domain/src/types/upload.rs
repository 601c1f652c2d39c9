//! Upload protocol payloads and progress snapshots

use serde::{Deserialize, Serialize};

/// Lifecycle of one part of a multi-part upload.
///
/// `Failed` is transient: the scheduler moves a failed part straight back
/// to `Pending` at the front of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartStatus {
    Pending,
    InFlight,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Negotiating,
    Transferring,
    Finalizing,
    Completed,
    Failed,
    Cancelled,
}

impl UploadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Snapshot published to progress observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    pub phase: UploadPhase,
    pub bytes_done: u64,
    pub total_bytes: u64,
    pub parts_done: u32,
    pub total_parts: u32,
    /// 0..=100; reaches 100 only once every byte is acknowledged
    pub percent: u8,
}

impl UploadProgress {
    pub fn new(total_bytes: u64, total_parts: u32) -> Self {
        Self {
            phase: UploadPhase::Negotiating,
            bytes_done: 0,
            total_bytes,
            parts_done: 0,
            total_parts,
            percent: 0,
        }
    }
}

/// Response of the direct upload and of session completion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReferenceResponse {
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitMultipartResponse {
    #[serde(default)]
    pub upload_session: Option<String>,
}

/// A part response may rotate the session identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartUploadResponse {
    #[serde(default)]
    pub upload_session: Option<String>,
}

/// Permanent reference to an uploaded file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_url: String,
    pub key: Option<String>,
    pub size: u64,
    /// 1 for a direct upload
    pub parts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_phases() {
        assert!(UploadPhase::Completed.is_terminal());
        assert!(UploadPhase::Cancelled.is_terminal());
        assert!(!UploadPhase::Transferring.is_terminal());
    }

    #[test]
    fn test_part_response_without_rotation() {
        let parsed: PartUploadResponse = serde_json::from_str(r#"{"status": 0}"#).unwrap();
        assert_eq!(parsed.upload_session, None);
    }
}
