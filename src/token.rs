//! Bearer token decoding
//!
//! Extracts the claim set carried in the payload segment of a compact
//! three-segment token. No signature verification is performed: the remote
//! service is the authority for every state-changing operation, and decoded
//! claims drive client-side gating only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Claim set carried by a bearer token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// User email
    pub email: String,
    /// User role
    pub role: String,
    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Expiration time (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

#[derive(Error, Debug)]
enum DecodeError {
    #[error("token does not have exactly three segments")]
    Segments,

    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("payload is not a valid claims object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode the payload segment of a three-segment token into [`Claims`].
///
/// Returns `None` for any structural problem (missing segment, invalid
/// base64, invalid JSON). Either the full claim set parses or nothing is
/// returned; callers must treat `None` as "no claims available".
pub fn decode(token: &str) -> Option<Claims> {
    match try_decode(token) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!("token decode failed: {}", e);
            None
        }
    }
}

fn try_decode(token: &str) -> Result<Claims, DecodeError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_), None) => payload,
        _ => return Err(DecodeError::Segments),
    };

    // Reverse the URL-safe alphabet substitutions, then restore padding
    // stripped by the issuer.
    let mut standard: String = payload
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    while standard.len() % 4 != 0 {
        standard.push('=');
    }

    let bytes = STANDARD.decode(standard)?;
    let text = String::from_utf8(bytes)?;
    Ok(serde_json::from_str(&text)?)
}

/// Role carried by the token, if it decodes
pub fn role_of(token: &str) -> Option<String> {
    decode(token).map(|c| c.role)
}

/// Subject carried by the token, if it decodes
pub fn subject_of(token: &str) -> Option<String> {
    decode(token).map(|c| c.sub)
}

/// Whether the token is expired at the current instant.
///
/// A token that fails to decode, or whose claims lack an expiry, is
/// treated as expired.
pub fn is_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// Expiry check against an explicit clock, for deterministic callers
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode(token).and_then(|c| c.exp) {
        Some(exp) => now >= exp,
        None => true,
    }
}
