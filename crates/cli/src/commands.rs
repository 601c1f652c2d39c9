//! Subcommand implementations

use std::fmt;
use std::sync::Arc;

use mgsdb_domain::constants::USERINFO_PATH;
use mgsdb_domain::{AuthUser, UploadedFile};
use mgsdb_infra::FileSource;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{Command, UploadArgs};
use crate::context::AppContext;
use crate::error::CliError;

/// Result of a subcommand, printable as text or JSON
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Report {
    Login { user: Option<String> },
    Upload { file: UploadedFile },
    Logout,
    Whoami { logged_in: bool, user: Option<Value> },
}

impl Report {
    /// # Errors
    /// Returns `CliError::Output` if JSON serialization fails.
    pub fn render(&self, json: bool) -> Result<String, CliError> {
        if json {
            Ok(serde_json::to_string_pretty(self)?)
        } else {
            Ok(self.to_string())
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Login { user: Some(user) } => write!(f, "Logged in as {user}"),
            Self::Login { user: None } => write!(f, "Logged in"),
            Self::Upload { file } => write!(
                f,
                "Uploaded {} bytes in {} part(s): {}",
                file.size, file.parts, file.file_url
            ),
            Self::Logout => write!(f, "Logged out"),
            Self::Whoami { logged_in: false, .. } => write!(f, "Not logged in"),
            Self::Whoami { user, .. } => {
                let name = user
                    .clone()
                    .map(AuthUser)
                    .and_then(|user| user.display_name().map(str::to_string))
                    .unwrap_or_else(|| "unknown user".to_string());
                write!(f, "Logged in as {name}")
            }
        }
    }
}

/// Run `command` against `ctx`.
///
/// # Errors
/// Returns the command's failure; see [`CliError::exit_code`].
pub async fn execute(ctx: &AppContext, command: &Command) -> Result<Report, CliError> {
    match command {
        Command::Login { username, password } => login(ctx, username, password).await,
        Command::Upload(args) => upload(ctx, args).await,
        Command::Logout => logout(ctx).await,
        Command::Whoami => whoami(ctx).await,
    }
}

async fn login(ctx: &AppContext, username: &str, password: &str) -> Result<Report, CliError> {
    let user = ctx.auth.login(username, password).await?;
    let user = user.and_then(|user| user.display_name().map(str::to_string));
    Ok(Report::Login { user })
}

async fn logout(ctx: &AppContext) -> Result<Report, CliError> {
    ctx.auth.logout().await;
    Ok(Report::Logout)
}

async fn whoami(ctx: &AppContext) -> Result<Report, CliError> {
    if !ctx.has_session() {
        return Ok(Report::Whoami { logged_in: false, user: None });
    }

    let user: Value = ctx.client.get(USERINFO_PATH).await?;
    ctx.credentials.set_user(Some(user.clone()));
    Ok(Report::Whoami { logged_in: true, user: Some(user) })
}

async fn upload(ctx: &AppContext, args: &UploadArgs) -> Result<Report, CliError> {
    if !ctx.has_session() {
        return Err(CliError::NotLoggedIn);
    }

    let mut source = FileSource::open(&args.file).await?;
    if let Some(name) = &args.name {
        source = source.with_file_name(name.as_str());
    }

    let handle = ctx.engine.spawn(Arc::new(source));
    let mut progress = handle.progress();
    let cancel = handle.cancellation_token();

    let reporter = tokio::spawn(async move {
        let mut last_percent = None;
        while progress.changed().await.is_ok() {
            let snapshot = *progress.borrow_and_update();
            if last_percent != Some(snapshot.percent) || snapshot.phase.is_terminal() {
                last_percent = Some(snapshot.percent);
                info!(
                    phase = ?snapshot.phase,
                    percent = snapshot.percent,
                    parts = %format!("{}/{}", snapshot.parts_done, snapshot.total_parts),
                    "Upload progress"
                );
            }
        }
    });

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling upload");
            cancel.cancel();
        }
    });

    let result = handle.wait().await;
    interrupt.abort();
    if let Err(err) = reporter.await {
        warn!(error = %err, "Progress reporter stopped unexpectedly");
    }

    Ok(Report::Upload { file: result? })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_upload_report_text_and_json() {
        let report = Report::Upload {
            file: UploadedFile {
                file_url: "https://files/scan.tif".into(),
                key: None,
                size: 12,
                parts: 3,
            },
        };

        assert_eq!(
            report.render(false).unwrap(),
            "Uploaded 12 bytes in 3 part(s): https://files/scan.tif"
        );
        let parsed: Value = serde_json::from_str(&report.render(true).unwrap()).unwrap();
        assert_eq!(parsed["command"], "upload");
        assert_eq!(parsed["file"]["parts"], 3);
    }

    #[test]
    fn test_whoami_text() {
        let report = Report::Whoami { logged_in: true, user: Some(json!({ "email": "a@b.c" })) };
        assert_eq!(report.to_string(), "Logged in as a@b.c");
        assert_eq!(Report::Whoami { logged_in: false, user: None }.to_string(), "Not logged in");
    }
}
