//! Token fixtures

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use serde_json::{json, Value};

/// Build a compact JWT with the given claims and a dummy signature.
pub fn unsigned_jwt(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// JWT for `subject` whose `exp` lies `seconds` from now (negative = past).
pub fn token_expiring_in(subject: &str, seconds: i64) -> String {
    let exp = (Utc::now() + Duration::seconds(seconds)).timestamp();
    unsigned_jwt(&json!({ "sub": subject, "exp": exp }))
}
