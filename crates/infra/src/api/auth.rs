//! Username/password authentication with refresh-token renewal
//!
//! The access token lives in a [`CredentialStore`]; the refresh token is
//! either stored there too or kept by the backend in an HttpOnly cookie, in
//! which case the refresh call simply sends an empty body.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use mgsdb_common::auth::CredentialStore;
use mgsdb_domain::constants::{LOGOUT_PATH, TOKEN_PATH, TOKEN_REFRESH_PATH, USERINFO_PATH};
use mgsdb_domain::{ApiConfig, AuthEvent, AuthUser, TokenResponse};
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};
use reqwest::{Method, Response, StatusCode};
use serde_json::json;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, instrument, warn};

use super::errors::ApiError;
use super::url::resolve_api_url;
use crate::http::HttpClient;

const EVENT_CAPACITY: usize = 16;

/// State guarded by the refresh gate
#[derive(Debug, Default)]
struct RefreshState {
    /// Access token a rejected refresh was attempted for, and the error it
    /// produced. Callers still holding that token share the error.
    rejected: Option<(Option<String>, ApiError)>,
}

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Token to attach to the next request, if any.
    fn access_token(&self) -> Option<String>;

    /// Obtain a new access token after `stale` was rejected.
    ///
    /// Implementations coalesce concurrent calls: when `stale` has already
    /// been replaced, the current token is returned without a network call.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ApiError>;
}

/// Login, refresh and logout against the MGSDB token endpoints
pub struct AuthService {
    http: HttpClient,
    base_url: String,
    credentials: Arc<CredentialStore>,
    refresh_gate: Mutex<RefreshState>,
    logging_out: AtomicBool,
    events: broadcast::Sender<AuthEvent>,
}

impl AuthService {
    pub fn new(
        http: HttpClient,
        base_url: impl Into<String>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            http,
            base_url: base_url.into(),
            credentials,
            refresh_gate: Mutex::new(RefreshState::default()),
            logging_out: AtomicBool::new(false),
            events,
        }
    }

    /// # Errors
    /// Returns `ApiError::Config` if the HTTP client cannot be built.
    pub fn from_config(
        config: &ApiConfig,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;
        Ok(Self::new(http, config.base_url.clone(), credentials))
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Exchange username and password for a token pair.
    ///
    /// The user profile comes from the token response or, failing that, a
    /// follow-up `GET` of the userinfo endpoint.
    ///
    /// # Errors
    /// - `ApiError::Unauthorized` when the backend rejects the credentials
    /// - `ApiError::Status` for any other non-2xx answer
    /// - `ApiError::NoAccessToken` when the response carries no token
    #[instrument(skip(self, password))]
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthUser>, ApiError> {
        self.logging_out.store(false, Ordering::SeqCst);
        let url = resolve_api_url(&self.base_url, TOKEN_PATH);
        let form = [("username", username), ("password", password)];

        let response = self.http.send(|http| http.request(Method::POST, &url).form(&form)).await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            warn!("Login rejected");
            return Err(ApiError::Unauthorized("UNAUTHORIZED".into()));
        }
        if !status.is_success() {
            let code = status.as_u16();
            return Err(ApiError::Status { status: code, message: format!("HTTP_{code}") });
        }

        let tokens = decode_tokens(response).await?;
        let user = tokens.user.clone();
        self.store_tokens(tokens)?;
        self.refresh_gate.lock().await.rejected = None;
        let user = match user {
            Some(user) => Some(user),
            None => self.fetch_current_user().await.ok(),
        };

        let name = user.as_ref().and_then(AuthUser::display_name).unwrap_or("unknown");
        info!(user = name, "Logged in");
        let _ = self.events.send(AuthEvent::Login { user: user.clone() });
        Ok(user)
    }

    /// Unconditionally request a new access token.
    ///
    /// # Errors
    /// - `ApiError::LoggedOut` while a logout is in progress
    /// - `ApiError::RefreshFailed` when the backend refuses or is unreachable
    /// - `ApiError::NoAccessToken` when the response carries no token
    ///
    /// A rejected refresh or one without a token clears the stored
    /// credentials; a network failure leaves them in place.
    pub async fn refresh(&self) -> Result<String, ApiError> {
        let mut state = self.refresh_gate.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut RefreshState) -> Result<String, ApiError> {
        if self.logging_out.load(Ordering::SeqCst) {
            return Err(ApiError::LoggedOut);
        }

        let attempted = self.credentials.access();

        let url = resolve_api_url(&self.base_url, TOKEN_REFRESH_PATH);
        let payload = match self.credentials.refresh() {
            Some(token) => json!({ "refresh_token": token }),
            None => json!({}),
        };
        let has_refresh_token = payload.get("refresh_token").is_some();
        debug!(has_refresh_token, "Refreshing access token");

        let response = self
            .http
            .send(|http| http.request(Method::POST, &url).json(&payload))
            .await
            .map_err(|e| ApiError::RefreshFailed(e.to_string()))?;
        if !response.status().is_success() {
            warn!(status = %response.status(), "Token refresh rejected");
            let err = ApiError::RefreshFailed("REFRESH_FAILED".into());
            return Err(self.reject(state, attempted, err));
        }

        let tokens = decode_tokens(response).await?;
        let has_user = tokens.user.is_some();
        let access = match self.store_tokens(tokens) {
            Ok(access) => access,
            Err(err) => return Err(self.reject(state, attempted, err)),
        };
        state.rejected = None;
        if !has_user {
            if let Err(err) = self.fetch_current_user().await {
                debug!(error = %err, "Profile refresh after token renewal failed");
            }
        }

        info!("Access token refreshed");
        Ok(access)
    }

    /// End the session locally and tell the backend.
    ///
    /// The backend call is advisory: failures are logged and local
    /// credentials are cleared regardless.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.logging_out.store(true, Ordering::SeqCst);
        let url = resolve_api_url(&self.base_url, LOGOUT_PATH);

        match self.http.send(|http| http.request(Method::POST, &url)).await {
            Ok(response)
                if response.status().is_success() || response.status() == StatusCode::NOT_FOUND =>
            {
                debug!(status = %response.status(), "Backend acknowledged logout");
            }
            Ok(response) => warn!(status = %response.status(), "Logout request did not succeed"),
            Err(err) => warn!(error = %err, "Failed to notify backend about logout"),
        }

        self.credentials.clear();
        self.credentials.set_force_relogin(true);
        info!("Logged out");
        let _ = self.events.send(AuthEvent::Logout);
    }

    /// `GET` the userinfo endpoint with the current token and cache the result.
    ///
    /// # Errors
    /// Returns the transport or status error; nothing is cached on failure.
    pub async fn fetch_current_user(&self) -> Result<AuthUser, ApiError> {
        let url = resolve_api_url(&self.base_url, USERINFO_PATH);
        let token = self.credentials.access();

        let response = self
            .http
            .send(|http| {
                let builder = http
                    .request(Method::GET, &url)
                    .header(ACCEPT, "application/json")
                    .header(CACHE_CONTROL, "no-cache")
                    .header(PRAGMA, "no-cache");
                match &token {
                    Some(token) => builder.bearer_auth(token),
                    None => builder,
                }
            })
            .await?;
        let status = response.status();
        if !status.is_success() {
            let message = "userinfo unavailable".to_string();
            return Err(ApiError::Status { status: status.as_u16(), message });
        }

        let user: AuthUser = response.json().await.map_err(|e| ApiError::Decode(e.to_string()))?;
        self.credentials.set_user(Some(user.0.clone()));
        Ok(user)
    }

    /// Logged in unless explicitly logged out or the token is missing or expired.
    pub fn is_logged_in(&self) -> bool {
        !self.credentials.force_relogin() && !self.credentials.is_access_missing_or_expired()
    }

    pub fn was_explicitly_logged_out(&self) -> bool {
        self.credentials.force_relogin()
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.credentials.user().map(AuthUser)
    }

    /// Receive login and logout notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Drop the credentials after an irrecoverable refresh failure and
    /// remember the outcome for callers holding the same token.
    fn reject(
        &self,
        state: &mut RefreshState,
        attempted: Option<String>,
        err: ApiError,
    ) -> ApiError {
        self.credentials.clear();
        state.rejected = Some((attempted, err.clone()));
        err
    }

    fn store_tokens(&self, tokens: TokenResponse) -> Result<String, ApiError> {
        let access = tokens.access_token.filter(|t| !t.is_empty()).ok_or(ApiError::NoAccessToken)?;
        self.credentials.set_access(access.clone());
        if let Some(refresh) = tokens.refresh_token.filter(|t| !t.is_empty()) {
            self.credentials.set_refresh(Some(refresh));
        }
        if let Some(user) = tokens.user {
            self.credentials.set_user(Some(user.0));
        }
        self.credentials.set_force_relogin(false);
        Ok(access)
    }
}

#[async_trait]
impl AccessTokenProvider for AuthService {
    fn access_token(&self) -> Option<String> {
        self.credentials.access()
    }

    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, ApiError> {
        let mut state = self.refresh_gate.lock().await;
        if self.logging_out.load(Ordering::SeqCst) {
            return Err(ApiError::LoggedOut);
        }
        if let Some((rejected, err)) = &state.rejected {
            if rejected.as_deref() == stale {
                debug!("Refresh for this token was already rejected");
                return Err(err.clone());
            }
        }
        if let Some(current) = self.credentials.access() {
            if stale != Some(current.as_str()) {
                debug!("Access token already replaced by a concurrent refresh");
                return Ok(current);
            }
        }
        self.refresh_locked(&mut state).await
    }
}

async fn decode_tokens(response: Response) -> Result<TokenResponse, ApiError> {
    response.json::<TokenResponse>().await.map_err(|e| ApiError::Decode(e.to_string()))
}
