//! Application constants
//!
//! Centralized location for endpoint paths, storage keys and transfer
//! defaults shared by every MGSDB crate.

// Transfer defaults
/// Size of one multi-part chunk (5 MiB). Files smaller than this are sent
/// in a single direct upload.
pub const DEFAULT_PART_SIZE: u64 = 5 * 1024 * 1024;
/// Maximum number of parts in flight at once.
pub const DEFAULT_UPLOAD_CONCURRENCY: usize = 6;
pub const DEFAULT_RETRY_INITIAL_DELAY_MS: u64 = 250;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 10_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Endpoints
pub const TOKEN_PATH: &str = "/api/token";
pub const TOKEN_REFRESH_PATH: &str = "/api/token/refresh";
pub const LOGOUT_PATH: &str = "/api/logout";
pub const USERINFO_PATH: &str = "/api/userinfo/";
pub const DIRECT_UPLOAD_PATH: &str = "/api/upload";
pub const INIT_MULTIPART_PATH: &str = "/api/development_data/init_multipart";
pub const UPLOAD_PART_PATH: &str = "/api/development_data/upload_part_direct";
pub const COMPLETE_MULTIPART_PATH: &str = "/api/development_data/complete_multipart";

/// Client-side page users are sent to when authentication is required.
pub const LOGIN_PATH: &str = "/login";

