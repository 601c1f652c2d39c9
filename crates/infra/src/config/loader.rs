//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Start from built-in defaults
//! 2. Overlay the explicit config file, or the first probed one
//! 3. Overlay environment variables
//! 4. Validate the result
//!
//! ## Environment Variables
//! - `MGSDB_API_BASE_URL`: Backend origin
//! - `MGSDB_API_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `MGSDB_API_MAX_ATTEMPTS`: Attempts per request for 5xx/connection failures
//! - `MGSDB_LOGIN_PATH`: Page users are redirected to when authentication is required
//! - `MGSDB_PART_SIZE`: Bytes per upload part
//! - `MGSDB_UPLOAD_CONCURRENCY`: Parts in flight at once
//! - `MGSDB_MAX_PART_ATTEMPTS`: Give up on a part after this many failures
//! - `MGSDB_PART_TIMEOUT_SECS`: Deadline for a single part call
//! - `MGSDB_SESSION_PATH`: JSON file backing the session store
//!
//! Empty variables are ignored.
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./mgsdb.{toml,json}` or `./config.{toml,json}` (current working directory)
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use mgsdb_domain::{Config, MgsdbError, Result};
use url::Url;

const CONFIG_FILE_NAMES: [&str; 4] = ["mgsdb.toml", "mgsdb.json", "config.toml", "config.json"];

/// Load configuration with the full layering strategy
///
/// `path` names an explicit config file; without it the standard locations
/// are probed and defaults are used when none exists.
///
/// # Errors
/// Returns `MgsdbError::Config` if:
/// - The explicit file does not exist or cannot be parsed
/// - An environment variable holds an invalid value
/// - The resulting configuration fails validation
pub fn load(path: Option<PathBuf>) -> Result<Config> {
    let mut config = match path.or_else(probe_config_paths) {
        Some(path) => load_from_file(&path)?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };

    apply_env_overrides(&mut config)?;
    validate(&config)?;
    Ok(config)
}

/// Load configuration from a file
///
/// Supports both JSON and TOML formats (detected by file extension).
/// Missing fields take their default values.
///
/// # Errors
/// Returns `MgsdbError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(MgsdbError::Config(format!("Config file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| MgsdbError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, path)
}

/// Overlay `MGSDB_*` environment variables onto `config`
///
/// # Errors
/// Returns `MgsdbError::Config` if a numeric variable does not parse.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(base_url) = env_var("MGSDB_API_BASE_URL") {
        config.api.base_url = base_url;
    }
    if let Some(timeout) = env_parse("MGSDB_API_TIMEOUT_SECS")? {
        config.api.timeout_secs = timeout;
    }
    if let Some(attempts) = env_parse("MGSDB_API_MAX_ATTEMPTS")? {
        config.api.max_attempts = attempts;
    }
    if let Some(login_path) = env_var("MGSDB_LOGIN_PATH") {
        config.api.login_path = login_path;
    }
    if let Some(part_size) = env_parse("MGSDB_PART_SIZE")? {
        config.upload.part_size = part_size;
    }
    if let Some(concurrency) = env_parse("MGSDB_UPLOAD_CONCURRENCY")? {
        config.upload.concurrency = concurrency;
    }
    if let Some(attempts) = env_parse("MGSDB_MAX_PART_ATTEMPTS")? {
        config.upload.max_part_attempts = Some(attempts);
    }
    if let Some(timeout) = env_parse("MGSDB_PART_TIMEOUT_SECS")? {
        config.upload.part_timeout_secs = Some(timeout);
    }
    if let Some(session_path) = env_var("MGSDB_SESSION_PATH") {
        config.session.storage_path = Some(session_path);
    }
    Ok(())
}

/// Domain validation plus a parseable absolute base URL
///
/// # Errors
/// Returns `MgsdbError::Config` describing the first problem found.
pub fn validate(config: &Config) -> Result<()> {
    config.validate()?;
    let base_url = &config.api.base_url;
    Url::parse(base_url).map_err(|e| {
        MgsdbError::Config(format!("api.base_url is not a valid URL ({e}): {base_url}"))
    })?;
    Ok(())
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MgsdbError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MgsdbError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MgsdbError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Non-empty environment variable
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|value| {
            value.parse::<T>().map_err(|e| MgsdbError::Config(format!("Invalid {key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const ALL_VARS: [&str; 9] = [
        "MGSDB_API_BASE_URL",
        "MGSDB_API_TIMEOUT_SECS",
        "MGSDB_API_MAX_ATTEMPTS",
        "MGSDB_LOGIN_PATH",
        "MGSDB_PART_SIZE",
        "MGSDB_UPLOAD_CONCURRENCY",
        "MGSDB_MAX_PART_ATTEMPTS",
        "MGSDB_PART_TIMEOUT_SECS",
        "MGSDB_SESSION_PATH",
    ];

    fn clear_env() {
        for key in ALL_VARS {
            std::env::remove_var(key);
        }
    }

    fn config_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("MGSDB_API_BASE_URL", "https://mgsdb.example.org/api");
        std::env::set_var("MGSDB_UPLOAD_CONCURRENCY", "3");
        std::env::set_var("MGSDB_MAX_PART_ATTEMPTS", "5");
        std::env::set_var("MGSDB_SESSION_PATH", "/tmp/session.json");
        std::env::set_var("MGSDB_PART_SIZE", "");

        let mut config = Config::default();
        apply_env_overrides(&mut config).unwrap();

        assert_eq!(config.api.base_url, "https://mgsdb.example.org/api");
        assert_eq!(config.upload.concurrency, 3);
        assert_eq!(config.upload.max_part_attempts, Some(5));
        assert_eq!(config.session.storage_path.as_deref(), Some("/tmp/session.json"));
        // empty values are ignored
        assert_eq!(config.upload.part_size, 5 * 1024 * 1024);

        clear_env();
    }

    #[test]
    fn test_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("MGSDB_UPLOAD_CONCURRENCY", "many");
        let result = apply_env_overrides(&mut Config::default());
        assert!(matches!(
            result,
            Err(MgsdbError::Config(msg)) if msg.contains("MGSDB_UPLOAD_CONCURRENCY")
        ));

        clear_env();
    }

    #[test]
    fn test_load_file_then_env() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        let file = config_file(
            ".toml",
            r#"
[api]
base_url = "https://files.example.org"

[upload]
concurrency = 2
part_timeout_secs = 120
"#,
        );
        std::env::set_var("MGSDB_UPLOAD_CONCURRENCY", "4");

        let config = load(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.api.base_url, "https://files.example.org");
        assert_eq!(config.upload.concurrency, 4);
        assert_eq!(config.upload.part_timeout_secs, Some(120));
        assert_eq!(config.api.login_path, "/login");

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let file = config_file(".json", r#"{ "upload": { "part_size": 1048576 } }"#);
        let config = load_from_file(file.path()).unwrap();
        assert_eq!(config.upload.part_size, 1_048_576);
        assert_eq!(config.upload.concurrency, 6);
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let file = config_file(".toml", "[upload\nconcurrency = ");
        assert!(matches!(load_from_file(file.path()), Err(MgsdbError::Config(_))));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = config_file(".yaml", "upload: {}");
        let err = load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        let result = load(Some(PathBuf::from("/nonexistent/mgsdb.toml")));
        assert!(matches!(result, Err(MgsdbError::Config(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.api.base_url = "not a url".into();
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.upload.concurrency = 0;
        assert!(validate(&config).is_err());

        assert!(validate(&Config::default()).is_ok());
    }
}
