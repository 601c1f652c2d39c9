//! Authentication payloads and events

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body returned by the login and refresh endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<AuthUser>,
}

/// Profile of the signed-in user, kept as the backend sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthUser(pub Value);

impl AuthUser {
    /// Best human-readable identifier the profile carries.
    pub fn display_name(&self) -> Option<&str> {
        ["username", "name", "email"]
            .iter()
            .find_map(|key| self.0.get(*key).and_then(Value::as_str))
    }

    pub fn is_admin(&self) -> bool {
        self.0.get("is_admin").and_then(Value::as_bool).unwrap_or(false)
            || self.0.get("is_staff").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Broadcast whenever the signed-in state changes
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    Login { user: Option<AuthUser> },
    Logout,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_token_response_tolerates_missing_fields() {
        let parsed: TokenResponse = serde_json::from_value(json!({ "access_token": "a" })).unwrap();
        assert_eq!(parsed.access_token.as_deref(), Some("a"));
        assert!(parsed.refresh_token.is_none());
        assert!(parsed.user.is_none());
    }

    #[test]
    fn test_display_name_prefers_username() {
        let user = AuthUser(json!({ "email": "a@b.c", "username": "alice" }));
        assert_eq!(user.display_name(), Some("alice"));

        let anonymous = AuthUser(json!({ "id": 7 }));
        assert_eq!(anonymous.display_name(), None);
    }

    #[test]
    fn test_is_admin_reads_staff_flag() {
        assert!(AuthUser(json!({ "is_staff": true })).is_admin());
        assert!(!AuthUser(json!({ "username": "bob" })).is_admin());
    }
}
