//! Credential store
//!
//! Holds the current access/refresh pair in memory and mirrors every change
//! into a [`SessionStorage`] backend so a restart of the same session picks
//! the credentials back up. Reads never touch the backend after
//! construction.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use super::jwt;
use super::storage::{MemorySessionStorage, SessionStorage, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const AUTH_USER_KEY: &str = "auth_user";
pub const FORCE_RELOGIN_KEY: &str = "auth_force_relogin";

#[derive(Debug, Default, Clone)]
struct Credentials {
    access: Option<String>,
    refresh: Option<String>,
    user: Option<Value>,
    force_relogin: bool,
}

/// Thread-safe holder of the current credential pair.
///
/// Persistence is best effort: a failing backend is logged and the
/// in-memory state still changes, so an outage of the storage never blocks
/// a request.
pub struct CredentialStore {
    state: RwLock<Credentials>,
    storage: Arc<dyn SessionStorage>,
}

impl CredentialStore {
    /// Create a store and load whatever the backend already holds.
    ///
    /// # Errors
    /// Returns the backend error if reading any key fails.
    pub fn load(storage: Arc<dyn SessionStorage>) -> Result<Self, StorageError> {
        let user = storage
            .get(AUTH_USER_KEY)?
            .and_then(|raw| serde_json::from_str::<Value>(&raw).ok());
        let state = Credentials {
            access: storage.get(ACCESS_TOKEN_KEY)?,
            refresh: storage.get(REFRESH_TOKEN_KEY)?,
            user,
            force_relogin: storage.get(FORCE_RELOGIN_KEY)?.as_deref() == Some("1"),
        };

        debug!(
            has_access = state.access.is_some(),
            has_refresh = state.refresh.is_some(),
            "Credential store loaded"
        );

        Ok(Self { state: RwLock::new(state), storage })
    }

    /// Store with no persistence beyond the process.
    pub fn in_memory() -> Self {
        Self {
            state: RwLock::new(Credentials::default()),
            storage: Arc::new(MemorySessionStorage::new()),
        }
    }

    pub fn access(&self) -> Option<String> {
        self.state.read().access.clone()
    }

    pub fn refresh(&self) -> Option<String> {
        self.state.read().refresh.clone()
    }

    pub fn set_access(&self, token: impl Into<String>) {
        let token = token.into();
        self.persist(ACCESS_TOKEN_KEY, Some(&token));
        self.state.write().access = Some(token);
    }

    /// Replace the refresh token; `None` removes it.
    pub fn set_refresh(&self, token: Option<String>) {
        self.persist(REFRESH_TOKEN_KEY, token.as_deref());
        self.state.write().refresh = token;
    }

    /// Drop both tokens and the cached user profile.
    pub fn clear(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, AUTH_USER_KEY] {
            self.persist(key, None);
        }
        let mut state = self.state.write();
        state.access = None;
        state.refresh = None;
        state.user = None;
    }

    /// Unverified expiry check of an arbitrary token.
    ///
    /// A token without a decodable `exp` claim counts as not expired.
    pub fn is_expired(token: &str) -> bool {
        jwt::is_expired(token)
    }

    pub fn is_access_missing_or_expired(&self) -> bool {
        self.state.read().access.as_deref().map_or(true, Self::is_expired)
    }

    pub fn user(&self) -> Option<Value> {
        self.state.read().user.clone()
    }

    pub fn set_user(&self, user: Option<Value>) {
        let raw = user.as_ref().map(Value::to_string);
        self.persist(AUTH_USER_KEY, raw.as_deref());
        self.state.write().user = user;
    }

    /// Marker left behind by an explicit logout; blocks silent re-login.
    pub fn force_relogin(&self) -> bool {
        self.state.read().force_relogin
    }

    pub fn set_force_relogin(&self, enabled: bool) {
        self.persist(FORCE_RELOGIN_KEY, enabled.then_some("1"));
        self.state.write().force_relogin = enabled;
    }

    fn persist(&self, key: &str, value: Option<&str>) {
        let result = match value {
            Some(value) => self.storage.set(key, value),
            None => self.storage.remove(key),
        };
        if let Err(err) = result {
            warn!(key, error = %err, "Failed to persist credential change");
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("CredentialStore")
            .field("has_access", &state.access.is_some())
            .field("has_refresh", &state.refresh.is_some())
            .field("force_relogin", &state.force_relogin)
            .finish()
    }
}
