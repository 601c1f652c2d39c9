//! In-memory upload source

use std::ops::Range;

use async_trait::async_trait;
use bytes::Bytes;
use mgsdb_domain::UploadError;

use super::ports::UploadSource;

/// Upload content already held in memory. Slicing is zero-copy.
#[derive(Debug, Clone)]
pub struct BytesSource {
    file_name: String,
    content: Bytes,
}

impl BytesSource {
    pub fn new(file_name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self { file_name: file_name.into(), content: content.into() }
    }
}

#[async_trait]
impl UploadSource for BytesSource {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn len(&self) -> u64 {
        self.content.len() as u64
    }

    async fn read_range(&self, range: Range<u64>) -> Result<Bytes, UploadError> {
        let out_of_bounds = || {
            UploadError::Source(format!(
                "range {}..{} outside of {} bytes",
                range.start,
                range.end,
                self.content.len()
            ))
        };
        let start = usize::try_from(range.start).map_err(|_| out_of_bounds())?;
        let end = usize::try_from(range.end).map_err(|_| out_of_bounds())?;
        if start > end || end > self.content.len() {
            return Err(out_of_bounds());
        }
        Ok(self.content.slice(start..end))
    }
}
