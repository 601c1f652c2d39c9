//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    COMPLETE_MULTIPART_PATH, DEFAULT_PART_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_INITIAL_DELAY_MS, DEFAULT_RETRY_MAX_DELAY_MS, DEFAULT_UPLOAD_CONCURRENCY,
    DIRECT_UPLOAD_PATH, INIT_MULTIPART_PATH, LOGIN_PATH, UPLOAD_PART_PATH,
};
use crate::errors::{MgsdbError, Result};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub upload: UploadSettings,
    pub session: SessionConfig,
}

impl Config {
    /// Reject values the transport cannot operate with.
    ///
    /// # Errors
    /// Returns `MgsdbError::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.api.timeout_secs == 0 {
            return Err(MgsdbError::Config("api.timeout_secs must be greater than zero".into()));
        }
        if !self.api.login_path.starts_with('/') {
            return Err(MgsdbError::Config(format!(
                "api.login_path must start with '/': {}",
                self.api.login_path
            )));
        }
        self.upload.validate()
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Backend origin, optionally ending in `/api` (e.g. "https://mgsdb.example.org/api")
    pub base_url: String,
    pub timeout_secs: u64,
    pub login_path: String,
    /// Attempts per request for connection failures and 5xx (1 = no retry)
    pub max_attempts: usize,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            login_path: LOGIN_PATH.to_string(),
            max_attempts: 1,
        }
    }
}

/// Chunked upload tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Bytes per part; also the direct-upload threshold
    pub part_size: u64,
    /// Maximum parts in flight
    pub concurrency: usize,
    /// Give up on a part after this many failed attempts (`None` retries forever)
    pub max_part_attempts: Option<u32>,
    pub retry_initial_delay_ms: u64,
    pub retry_max_delay_ms: u64,
    /// Deadline for a single part call (`None` relies on the HTTP timeout)
    pub part_timeout_secs: Option<u64>,
    pub endpoints: UploadEndpoints,
}

impl UploadSettings {
    /// # Errors
    /// Returns `MgsdbError::Config` if part size or concurrency is zero.
    pub fn validate(&self) -> Result<()> {
        if self.part_size == 0 {
            return Err(MgsdbError::Config("upload.part_size must be greater than zero".into()));
        }
        if self.concurrency == 0 {
            return Err(MgsdbError::Config("upload.concurrency must be greater than zero".into()));
        }
        if self.max_part_attempts == Some(0) {
            return Err(MgsdbError::Config(
                "upload.max_part_attempts must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }

    pub fn part_timeout(&self) -> Option<Duration> {
        self.part_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            max_part_attempts: None,
            retry_initial_delay_ms: DEFAULT_RETRY_INITIAL_DELAY_MS,
            retry_max_delay_ms: DEFAULT_RETRY_MAX_DELAY_MS,
            part_timeout_secs: None,
            endpoints: UploadEndpoints::default(),
        }
    }
}

/// Paths of the upload protocol, relative to `api.base_url`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadEndpoints {
    pub direct: String,
    pub init: String,
    pub part: String,
    pub complete: String,
}

impl Default for UploadEndpoints {
    fn default() -> Self {
        Self {
            direct: DIRECT_UPLOAD_PATH.to_string(),
            init: INIT_MULTIPART_PATH.to_string(),
            part: UPLOAD_PART_PATH.to_string(),
            complete: COMPLETE_MULTIPART_PATH.to_string(),
        }
    }
}

/// Where credentials survive between runs of the same session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// JSON file backing the session store; in-memory only when unset
    pub storage_path: Option<String>,
}
