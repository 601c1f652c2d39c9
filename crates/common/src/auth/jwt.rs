//! Unverified JWT claim inspection
//!
//! The client never validates signatures; it only peeks at `exp` to decide
//! whether a stored access token is worth sending.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};

/// Decode the payload segment of a compact JWT.
///
/// Returns `None` for anything that is not three dot-separated segments with
/// a base64url JSON object in the middle.
pub fn decode_claims(token: &str) -> Option<Map<String, Value>> {
    let mut segments = token.split('.');
    let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
    if segments.next().is_some() {
        return None;
    }

    // Some issuers keep the padding; the engine rejects it.
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    match serde_json::from_slice(&bytes).ok()? {
        Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Bound on fractional `exp` values; every instant `DateTime<Utc>` can hold
/// lies well inside it.
const MAX_FRACTIONAL_EXP: f64 = 1e15;

/// Expiry instant from the `exp` claim, if present and numeric.
///
/// Fractional values are truncated to whole seconds; values outside the
/// representable range count as having no expiry.
pub fn expires_at(token: &str) -> Option<DateTime<Utc>> {
    let claims = decode_claims(token)?;
    let exp = claims.get("exp")?;
    let secs = match exp.as_i64() {
        Some(secs) => secs,
        None => whole_seconds(exp.as_f64()?)?,
    };
    Utc.timestamp_opt(secs, 0).single()
}

// the range check makes the cast lossless apart from the dropped fraction
#[allow(clippy::cast_possible_truncation)]
fn whole_seconds(exp: f64) -> Option<i64> {
    if !exp.is_finite() || exp.abs() > MAX_FRACTIONAL_EXP {
        return None;
    }
    Some(exp.trunc() as i64)
}

/// Whether the token's `exp` lies at or before `now`.
///
/// Tokens without a readable `exp` are treated as not expired; the server
/// remains the authority and answers 401 if it disagrees.
pub fn is_expired_at(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}

pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now())
}
