//! Client-side JWT expiry check.
//!
//! Only the `exp` claim is read. The signature is not verified; the
//! backend remains the authority on token validity.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::Value;

use crate::util::unix_timestamp_now;

/// The `exp` claim of a JWT in seconds since the epoch.
///
/// Returns `None` when the token is not three dot-separated segments, the
/// payload is not base64url JSON, or the claim is missing.
pub fn token_expiry(token: &str) -> Option<i64> {
    let mut segments = token.trim().split('.');
    let (_header, payload) = (segments.next()?, segments.next()?);
    segments.next()?;

    // Tolerate padding and the standard alphabet
    let normalized: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|ch| match ch {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let bytes = URL_SAFE_NO_PAD.decode(normalized).ok()?;
    let claims: Value = serde_json::from_slice(&bytes).ok()?;
    let exp = claims.get("exp")?;

    #[allow(clippy::cast_possible_truncation)]
    exp.as_i64()
        .or_else(|| exp.as_f64().filter(|value| value.is_finite()).map(|value| value as i64))
}

/// Whether the token must be treated as expired right now.
pub fn is_token_expired(token: &str) -> bool {
    is_token_expired_at(token, unix_timestamp_now())
}

/// Expired when `exp < now` or when the expiry cannot be decoded.
pub fn is_token_expired_at(token: &str, now: i64) -> bool {
    match token_expiry(token) {
        Some(exp) => exp < now,
        None => true,
    }
}
