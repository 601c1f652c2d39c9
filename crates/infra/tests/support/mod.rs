//! Shared wiring for `mgsdb-infra` integration tests.
//!
//! Builds the full client stack against a `wiremock` server: credential
//! store, auth service, navigator and executor.

#![allow(dead_code)]

use std::sync::Arc;

use mgsdb_common::CredentialStore;
use mgsdb_infra::{ApiClient, ApiClientConfig, AuthService, HttpClient, SessionNavigator};
use wiremock::MockServer;

pub struct Stack {
    pub server: MockServer,
    pub credentials: Arc<CredentialStore>,
    pub auth: Arc<AuthService>,
    pub navigator: Arc<SessionNavigator>,
    pub client: Arc<ApiClient>,
}

/// Client stack for a session currently showing `location`.
pub async fn stack(location: &str) -> Stack {
    let server = MockServer::start().await;
    let credentials = Arc::new(CredentialStore::in_memory());
    let auth = Arc::new(AuthService::new(
        HttpClient::new().unwrap(),
        server.uri(),
        Arc::clone(&credentials),
    ));
    let navigator = Arc::new(SessionNavigator::new(location));
    let config = ApiClientConfig { base_url: server.uri(), ..Default::default() };
    let client = Arc::new(
        ApiClient::builder()
            .config(config)
            .auth(auth.clone())
            .navigator(navigator.clone())
            .build()
            .unwrap(),
    );

    Stack { server, credentials, auth, navigator, client }
}

/// Number of requests the server received for `path`.
pub async fn hits(server: &MockServer, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == path)
        .count()
}
