//! File-backed upload content

use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use mgsdb_core::UploadSource;
use mgsdb_domain::UploadError;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// A file on disk, read one part at a time.
///
/// Each read opens its own handle, so parts in flight never contend for a
/// shared cursor and only the parts currently being sent are in memory.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    file_name: String,
    len: u64,
}

impl FileSource {
    /// # Errors
    /// Returns `UploadError::Source` if the path is missing or not a file.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref().to_path_buf();
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| UploadError::Source(format!("{}: {e}", path.display())))?;
        if !metadata.is_file() {
            return Err(UploadError::Source(format!("{} is not a regular file", path.display())));
        }

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.bin".to_string());

        Ok(Self { path, file_name, len: metadata.len() })
    }

    /// Announce the file under a different name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl UploadSource for FileSource {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn len(&self) -> u64 {
        self.len
    }

    async fn read_range(&self, range: Range<u64>) -> Result<Bytes, UploadError> {
        if range.start > range.end || range.end > self.len {
            return Err(UploadError::Source(format!(
                "range {}..{} outside of {} bytes",
                range.start, range.end, self.len
            )));
        }
        let read_error =
            |e: std::io::Error| UploadError::Source(format!("{}: {e}", self.path.display()));

        let length = usize::try_from(range.end - range.start)
            .map_err(|_| UploadError::Source("part does not fit in memory".into()))?;
        let mut file = File::open(&self.path).await.map_err(read_error)?;
        file.seek(SeekFrom::Start(range.start)).await.map_err(read_error)?;

        let mut buffer = vec![0u8; length];
        file.read_exact(&mut buffer).await.map_err(read_error)?;
        Ok(Bytes::from(buffer))
    }
}
