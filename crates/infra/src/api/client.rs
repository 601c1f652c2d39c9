//! Authenticated call executor
//!
//! Every backend call goes through [`ApiClient::execute`], which attaches
//! the bearer token, disables caching and never follows redirects. A 401
//! triggers exactly one refresh and one re-issue of the same request; a
//! failed refresh or a redirect sends the session to the login page.

use std::sync::Arc;
use std::time::Duration;

use mgsdb_core::{is_login_location, login_redirect_target, LoginNavigator};
use mgsdb_domain::ApiConfig;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::auth::AccessTokenProvider;
use super::envelope::unwrap_envelope;
use super::errors::ApiError;
use super::request::{ApiRequest, ErrorMode};
use super::url::resolve_api_url;
use crate::http::HttpClient;
use crate::navigation::SessionNavigator;

/// Configuration for API client
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Base URL for API (e.g., "https://mgsdb.example.org")
    pub base_url: String,
    /// Timeout for API requests
    pub timeout: Duration,
    /// Attempts per request for connection failures and 5xx
    pub max_attempts: usize,
    pub login_path: String,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for ApiClientConfig {
    fn from(config: &ApiConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
            max_attempts: config.max_attempts.max(1),
            login_path: config.login_path.clone(),
        }
    }
}

/// API client with refresh-once semantics
pub struct ApiClient {
    http_client: HttpClient,
    auth: Arc<dyn AccessTokenProvider>,
    navigator: Arc<dyn LoginNavigator>,
    config: ApiClientConfig,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns error if the HttpClient cannot be created
    pub fn new(
        config: ApiClientConfig,
        auth: Arc<dyn AccessTokenProvider>,
        navigator: Arc<dyn LoginNavigator>,
    ) -> Result<Self, ApiError> {
        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(config.max_attempts)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HttpClient: {e}")))?;

        Ok(Self { http_client, auth, navigator, config })
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn config(&self) -> &ApiClientConfig {
        &self.config
    }

    /// Send `request`, refreshing the access token once on a 401.
    ///
    /// With `ErrorMode::Throw` any non-2xx answer becomes an error; with
    /// `ErrorMode::Return` it is handed back. A 401 that survives the retry
    /// is an error in both modes.
    ///
    /// # Errors
    /// - the refresh error when the token cannot be renewed
    /// - `ApiError::Unauthorized` when the retried call is rejected again
    /// - `ApiError::LoginRequired` when the backend answers with a redirect
    /// - `ApiError::Timeout` when the call exceeds its deadline
    /// - `ApiError::Status` for other non-2xx answers in throw mode
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn execute(&self, request: ApiRequest) -> Result<Response, ApiError> {
        let url = resolve_api_url(&self.config.base_url, &request.path);
        let token = self.auth.access_token();
        let mut response = self.send_once(&request, &url, token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!(had_token = token.is_some(), "Access token rejected, refreshing");
            let fresh = match self.auth.refresh_access_token(token.as_deref()).await {
                Ok(fresh) => fresh,
                Err(err) => {
                    warn!(error = %err, "Token refresh failed");
                    self.redirect_to_login();
                    return Err(err);
                }
            };

            response = self.send_once(&request, &url, Some(&fresh)).await?;
            if response.status() == StatusCode::UNAUTHORIZED {
                warn!("Refreshed access token rejected");
                return Err(ApiError::Unauthorized(format!(
                    "{url} rejected the refreshed access token"
                )));
            }
        }

        let status = response.status();
        if status.is_redirection() {
            warn!(%status, "Backend redirected the call, login required");
            self.redirect_to_login();
            return Err(ApiError::LoginRequired);
        }

        if status.is_success() || request.error_mode == ErrorMode::Return {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::map_status_error(status, &url, &body))
    }

    /// Execute `request` and decode its JSON body, unwrapping status
    /// envelopes.
    ///
    /// # Errors
    ///
    /// Everything [`execute`](Self::execute) returns, plus
    /// `ApiError::Business` for a non-zero envelope status and
    /// `ApiError::Decode` for bodies that do not match `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let response = self.execute(request.error_mode(ErrorMode::Throw)).await?;
        let status = response.status();

        // 204/205 have no body by RFC
        let value = if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
            Value::Null
        } else {
            response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::Decode(format!("Failed to parse response: {e}")))?
        };

        let data = unwrap_envelope(value)?;
        let result = serde_json::from_value(data)
            .map_err(|e| ApiError::Decode(format!("Unexpected response shape: {e}")))?;

        debug!(path = %path, "Request successful");
        Ok(result)
    }

    /// Execute a GET request
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    /// Execute a POST request with a JSON body
    ///
    /// # Errors
    ///
    /// Returns error if request fails or response cannot be deserialized
    pub async fn post<T: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<R, ApiError> {
        let body = serde_json::to_value(body)
            .map_err(|e| ApiError::Config(format!("Failed to serialize body: {e}")))?;
        self.send_json(ApiRequest::post(path).json(body)).await
    }

    async fn send_once(
        &self,
        request: &ApiRequest,
        url: &str,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let timeout = request.timeout.unwrap_or(self.config.timeout);
        let call = self.http_client.send(|http| {
            let builder = request
                .to_builder(http, url)
                .timeout(timeout)
                .header(CACHE_CONTROL, "no-cache")
                .header(PRAGMA, "no-cache");
            match token {
                Some(token) => builder.bearer_auth(token),
                None => builder,
            }
        });

        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::Timeout(timeout)),
        }
    }

    fn redirect_to_login(&self) {
        let current = self.navigator.current_location();
        if is_login_location(&current, &self.config.login_path) {
            debug!("Already on the login page");
            return;
        }
        let target = login_redirect_target(&self.config.login_path, &current, None);
        info!(target = %target, "Redirecting to login");
        self.navigator.navigate(&target);
    }

    fn map_status_error(status: StatusCode, url: &str, body: &str) -> ApiError {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| value.get("detail").and_then(Value::as_str).map(str::to_string));

        let message = match detail {
            Some(detail) => detail,
            None if body.is_empty() => format!("{url} returned status {status}"),
            None => format!("{url} returned status {status}: {body}"),
        };

        ApiError::Status { status: status.as_u16(), message }
    }
}

/// Builder for API client
#[derive(Default)]
pub struct ApiClientBuilder {
    config: Option<ApiClientConfig>,
    auth: Option<Arc<dyn AccessTokenProvider>>,
    navigator: Option<Arc<dyn LoginNavigator>>,
}

impl ApiClientBuilder {
    /// Set the API configuration
    pub fn config(mut self, config: ApiClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the authentication provider
    pub fn auth(mut self, auth: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Where login redirects go; defaults to a [`SessionNavigator`] at `/`
    pub fn navigator(mut self, navigator: Arc<dyn LoginNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the API client
    ///
    /// # Errors
    ///
    /// Returns error if required fields are missing or client creation fails
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let config = self.config.unwrap_or_default();
        let auth =
            self.auth.ok_or_else(|| ApiError::Config("Auth provider not set".to_string()))?;
        let navigator = self.navigator.unwrap_or_else(|| Arc::new(SessionNavigator::default()));

        ApiClient::new(config, auth, navigator)
    }
}
