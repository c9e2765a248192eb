//! Token expiry checks.
//!
//! Tokens are decoded, never verified: the signature is the backend's
//! concern, the gate only avoids routing users with stale sessions.

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use serde_json::Value;

/// base64url with optional padding, as found in JWT segments.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode the payload (middle) segment of a JWT.
///
/// Returns `None` if the token has no payload segment or it is not
/// base64url-encoded JSON.
pub fn decode_payload(token: &str) -> Option<Value> {
    let segment = token.split('.').nth(1).filter(|s| !s.is_empty())?;
    let bytes = match URL_SAFE_LENIENT.decode(segment) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("Token payload is not base64url: {}", e);
            return None;
        }
    };
    serde_json::from_slice(&bytes).ok()
}

/// Expiry of a token in milliseconds since the Unix epoch.
///
/// Missing, zero, or non-numeric `exp` claims yield `None`.
pub fn expiry_millis(token: &str) -> Option<f64> {
    let exp = decode_payload(token)?.get("exp")?.as_f64()?;
    if exp == 0.0 || !exp.is_finite() {
        return None;
    }
    Some(exp * 1000.0)
}

/// Whether `token` is expired at `now_ms`. Undecodable tokens are expired.
pub fn is_token_expired(token: &str, now_ms: u64) -> bool {
    match expiry_millis(token) {
        Some(expires_at) => now_ms as f64 > expires_at,
        None => true,
    }
}

#[cfg(test)]
pub(crate) fn make_token(payload: &Value) -> String {
    let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    format!(
        "{}.{}.signature",
        engine.encode(br#"{"alg":"HS256","typ":"JWT"}"#),
        engine.encode(payload.to_string())
    )
}
