use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Query parameters sent to the token endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct RefreshParams<'a> {
    /// The current refresh token.
    pub code: &'a str,
}

/// Builds `POST {endpoint}?code={refresh_token}`.
pub(crate) fn refresh_url(endpoint: &str, refresh_token: &str) -> Result<String> {
    let params = serde_qs::to_string(&RefreshParams { code: refresh_token })
        .map_err(|e| Error::config(format!("failed to encode refresh request: {e}")))?;
    let sep = if endpoint.contains('?') { '&' } else { '?' };
    Ok(format!("{endpoint}{sep}{params}"))
}

#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<Value>,
}

/// Response when exchanging a refresh token for an access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    /// Replaces the refresh token that was sent.
    pub refresh_token: String,
    pub expires_in: Option<Duration>,
}

impl TokenResponse {
    /// Parses and validates a response body. Anything that is not a JSON object carrying
    /// both tokens is a [`Error::Protocol`] holding the raw body.
    pub fn parse(body: &str) -> Result<Self> {
        let malformed = || Error::Protocol { body: body.to_string() };
        let raw: RawTokenResponse = serde_json::from_str(body).map_err(|_| malformed())?;
        let access_token = raw.access_token.filter(|t| !t.is_empty()).ok_or_else(malformed)?;
        let refresh_token = raw.refresh_token.filter(|t| !t.is_empty()).ok_or_else(malformed)?;
        Ok(TokenResponse {
            access_token,
            refresh_token,
            expires_in: raw.expires_in.as_ref().and_then(expires_in_secs).map(Duration::from_secs),
        })
    }
}

// Numbers and numeric strings are both seen in the wild. Zero means no expiry.
fn expires_in_secs(value: &Value) -> Option<u64> {
    let secs = match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    secs.filter(|s| *s > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encodes_refresh_token() {
        assert_eq!(
            refresh_url("https://auth.example/token", "a+b/c").unwrap(),
            "https://auth.example/token?code=a%2Bb%2Fc"
        );
        assert_eq!(
            refresh_url("https://auth.example/token?v=2", "abc").unwrap(),
            "https://auth.example/token?v=2&code=abc"
        );
    }

    #[test]
    fn parses_minimal_response() {
        let res = TokenResponse::parse(r#"{"access_token":"A","refresh_token":"B"}"#).unwrap();
        assert_eq!(res.access_token, "A");
        assert_eq!(res.refresh_token, "B");
        assert_eq!(res.expires_in, None);
    }

    #[test]
    fn parses_expires_in() {
        let res = TokenResponse::parse(r#"{"access_token":"A","refresh_token":"B","expires_in":3600}"#).unwrap();
        assert_eq!(res.expires_in, Some(Duration::from_secs(3600)));

        let res = TokenResponse::parse(r#"{"access_token":"A","refresh_token":"B","expires_in":"60"}"#).unwrap();
        assert_eq!(res.expires_in, Some(Duration::from_secs(60)));

        let res = TokenResponse::parse(r#"{"access_token":"A","refresh_token":"B","expires_in":0}"#).unwrap();
        assert_eq!(res.expires_in, None);

        let res = TokenResponse::parse(r#"{"access_token":"A","refresh_token":"B","expires_in":"soon"}"#).unwrap();
        assert_eq!(res.expires_in, None);
    }

    #[test]
    fn missing_tokens_are_protocol_errors() {
        for body in [
            r#"{"refresh_token":"B"}"#,
            r#"{"access_token":"A"}"#,
            r#"{"access_token":"","refresh_token":"B"}"#,
            r#"{"access_token":1,"refresh_token":"B"}"#,
        ] {
            let err = TokenResponse::parse(body).unwrap_err();
            assert_eq!(err.body(), Some(body));
        }
    }

    #[test]
    fn non_json_is_protocol_error() {
        for body in ["<html>Sign in</html>", "", "null", "[]"] {
            let err = TokenResponse::parse(body).unwrap_err();
            assert!(matches!(err, Error::Protocol { .. }), "{body:?}");
        }
    }
}
