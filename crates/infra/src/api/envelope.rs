//! Business-status envelopes
//!
//! Some endpoints answer 2xx with `{"status": <code>, "data": ..., "message": ...}`
//! and signal failures through a non-zero `status`.

use serde_json::Value;

use super::errors::ApiError;

/// Strip the envelope from a decoded 2xx body.
///
/// Values without a numeric `status` field are returned unchanged.
///
/// # Errors
/// Returns `ApiError::Business` when `status` is non-zero.
pub fn unwrap_envelope(value: Value) -> Result<Value, ApiError> {
    let Value::Object(mut map) = value else {
        return Ok(value);
    };
    let Some(status) = map.get("status").and_then(Value::as_i64) else {
        return Ok(Value::Object(map));
    };

    if status != 0 {
        let message = map
            .get("message")
            .or_else(|| map.get("detail"))
            .and_then(Value::as_str)
            .unwrap_or("request rejected")
            .to_string();
        return Err(ApiError::Business { status, message });
    }

    match map.remove("data") {
        Some(data) => Ok(data),
        None => Ok(Value::Object(map)),
    }
}
