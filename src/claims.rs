use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{Map, Value};
use thiserror::Error;

/// The claims of an access token that the refresher cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedClaims {
    /// Not-before, seconds since the epoch.
    pub nbf: Option<i64>,
    pub exp: Option<i64>,
    /// Space-separated scopes.
    pub scp: Option<String>,
}

impl DecodedClaims {
    /// Picks out the known claims. Each is read on its own, so an odd value in one
    /// never hides the others.
    fn from_payload(payload: &Map<String, Value>) -> Self {
        DecodedClaims {
            nbf: payload.get("nbf").and_then(epoch_secs),
            exp: payload.get("exp").and_then(epoch_secs),
            scp: payload.get("scp").and_then(scope),
        }
    }
}

// Fractional timestamps are truncated.
fn epoch_secs(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn scope(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(items.iter().filter_map(Value::as_str).collect::<Vec<_>>().join(" ")),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("token is not a JWT")]
    Format,
    #[error("invalid base64 in JWT payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid JWT payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the payload of `token` without verifying its signature.
///
/// Only used for diagnostics and clock-skew compensation; the token is handed
/// back to the caller untouched.
pub fn decode_claims(token: &str) -> Result<DecodedClaims, ClaimsError> {
    let mut parts = token.split('.');
    let payload = match (parts.next(), parts.next()) {
        (Some(_), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(ClaimsError::Format),
    };
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let payload: Map<String, Value> = serde_json::from_slice(&bytes)?;
    Ok(DecodedClaims::from_payload(&payload))
}
