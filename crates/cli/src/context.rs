//! Application context - dependency injection container

use std::sync::Arc;

use mgsdb_common::{CredentialStore, FileSessionStorage};
use mgsdb_core::UploadEngine;
use mgsdb_domain::{Config, SessionConfig};
use mgsdb_infra::{ApiClient, ApiClientConfig, AuthService, HttpUploadTransport, SessionNavigator};
use tracing::{debug, info};

use crate::error::CliError;

/// Location reported to the navigator; login redirects carry it as `next`.
const UPLOAD_LOCATION: &str = "/upload";

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub credentials: Arc<CredentialStore>,
    pub auth: Arc<AuthService>,
    pub navigator: Arc<SessionNavigator>,
    pub client: Arc<ApiClient>,
    pub engine: Arc<UploadEngine>,
}

impl AppContext {
    /// Wire the services for `config`.
    ///
    /// # Errors
    /// Returns `CliError::Session` if the session file cannot be read and
    /// `CliError::Api` if the HTTP clients cannot be built.
    pub fn new(config: Config) -> Result<Self, CliError> {
        let credentials = Arc::new(open_credentials(&config.session)?);
        let auth = Arc::new(AuthService::from_config(&config.api, Arc::clone(&credentials))?);
        let navigator = Arc::new(SessionNavigator::new(UPLOAD_LOCATION));

        let client = Arc::new(
            ApiClient::builder()
                .config(ApiClientConfig::from(&config.api))
                .auth(auth.clone())
                .navigator(navigator.clone())
                .build()?,
        );

        let transport =
            HttpUploadTransport::new(Arc::clone(&client), config.upload.endpoints.clone());
        let engine = Arc::new(UploadEngine::from_settings(Arc::new(transport), &config.upload));

        info!(base_url = %config.api.base_url, "Application context ready");
        Ok(Self { config, credentials, auth, navigator, client, engine })
    }

    /// A session worth trying: a live access token, or a refresh token to
    /// obtain one.
    pub fn has_session(&self) -> bool {
        self.auth.is_logged_in()
            || (!self.auth.was_explicitly_logged_out() && self.credentials.refresh().is_some())
    }
}

fn open_credentials(session: &SessionConfig) -> Result<CredentialStore, CliError> {
    match &session.storage_path {
        Some(path) => {
            debug!(path = %path, "Opening session file");
            let storage = FileSessionStorage::open(path)?;
            Ok(CredentialStore::load(Arc::new(storage))?)
        }
        None => Ok(CredentialStore::in_memory()),
    }
}
