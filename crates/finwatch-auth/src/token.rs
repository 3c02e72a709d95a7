//! Access token inspection.
//!
//! Tokens are JWT-shaped (`header.payload.signature`). Only the `exp` claim
//! is read; signatures are the backend's business.

use crate::{AuthError, AuthResult};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};

/// Decode the `exp` claim of `token`.
///
/// A token without a parseable expiry is rejected, so a garbage response
/// from the refresh endpoint is never accepted as a new credential.
pub fn expires_at(token: &str) -> AuthResult<DateTime<Utc>> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if !payload.is_empty() => payload,
        _ => {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".to_string(),
            ))
        }
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::MalformedToken(format!("payload is not base64url: {}", e)))?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedToken(format!("payload is not JSON: {}", e)))?;

    let exp = claims
        .get("exp")
        .and_then(serde_json::Value::as_f64)
        .ok_or_else(|| AuthError::MalformedToken("missing numeric exp claim".to_string()))?;

    DateTime::from_timestamp(exp as i64, 0)
        .ok_or_else(|| AuthError::MalformedToken(format!("exp {} is out of range", exp)))
}

/// Whether `token` is past its expiry at `now`. Unreadable tokens count as expired.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    expires_at(token).map(|exp| exp <= now).unwrap_or(true)
}
