//! Command-line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mgsdb_domain::Config;

/// Session file used when neither the flag nor the config names one
pub const DEFAULT_SESSION_FILE: &str = ".mgsdb-session.json";

#[derive(Debug, Parser)]
#[command(name = "mgsdb-upload", version, about = "Upload files to MGSDB")]
pub struct Cli {
    /// Config file (TOML or JSON); standard locations are probed when omitted
    #[arg(long, global = true, env = "MGSDB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Backend origin, e.g. https://mgsdb.example.org
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// File keeping tokens between runs
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with username and password
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long, env = "MGSDB_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Upload a file, in parts when it is larger than one part
    Upload(UploadArgs),
    /// End the session here and on the backend
    Logout,
    /// Show the signed-in user
    Whoami,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    pub file: PathBuf,

    /// Name announced to the server instead of the file's own
    #[arg(long)]
    pub name: Option<String>,

    /// Parts in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Bytes per part
    #[arg(long)]
    pub part_size: Option<u64>,

    /// Seconds before a single part call is abandoned and retried
    #[arg(long)]
    pub part_timeout: Option<u64>,

    /// Give up on a part after this many failed attempts
    #[arg(long)]
    pub max_part_attempts: Option<u32>,
}

impl Cli {
    /// Layer command-line flags over the loaded configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(base_url) = &self.base_url {
            config.api.base_url.clone_from(base_url);
        }

        if let Some(session) = &self.session {
            config.session.storage_path = Some(session.display().to_string());
        } else if config.session.storage_path.is_none() {
            config.session.storage_path = Some(default_session_path().display().to_string());
        }

        if let Command::Upload(args) = &self.command {
            if let Some(concurrency) = args.concurrency {
                config.upload.concurrency = concurrency;
            }
            if let Some(part_size) = args.part_size {
                config.upload.part_size = part_size;
            }
            if let Some(timeout) = args.part_timeout {
                config.upload.part_timeout_secs = Some(timeout);
            }
            if let Some(attempts) = args.max_part_attempts {
                config.upload.max_part_attempts = Some(attempts);
            }
        }
    }
}

fn default_session_path() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_SESSION_FILE)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_flags_override_config() {
        let cli = Cli::try_parse_from([
            "mgsdb-upload",
            "--base-url",
            "https://mgsdb.example.org",
            "--session",
            "/tmp/s.json",
            "upload",
            "scan.tif",
            "--concurrency",
            "2",
            "--part-size",
            "1048576",
        ])
        .unwrap();

        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.api.base_url, "https://mgsdb.example.org");
        assert_eq!(config.session.storage_path.as_deref(), Some("/tmp/s.json"));
        assert_eq!(config.upload.concurrency, 2);
        assert_eq!(config.upload.part_size, 1_048_576);
        assert_eq!(config.upload.part_timeout_secs, None);
    }

    #[test]
    fn test_configured_session_path_is_kept() {
        let cli = Cli::try_parse_from(["mgsdb-upload", "whoami"]).unwrap();
        let mut config = Config::default();
        config.session.storage_path = Some("/var/lib/mgsdb/session.json".into());

        cli.apply_overrides(&mut config);
        assert_eq!(config.session.storage_path.as_deref(), Some("/var/lib/mgsdb/session.json"));
    }

    #[test]
    fn test_login_requires_username() {
        assert!(Cli::try_parse_from(["mgsdb-upload", "login", "-p", "secret"]).is_err());
    }
}
