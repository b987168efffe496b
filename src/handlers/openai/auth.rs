//! Inbound credential extraction
//!
//! The client's OpenAI `api_key` is the Kiro access token. It arrives as
//! `Authorization: Bearer <token>` from OpenAI SDKs, or as the bare token
//! from hand-rolled clients.

use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::normalize;
use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Why no token could be taken from the request
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Authorization header is missing")]
    Missing,

    #[error("Authorization header is malformed")]
    InvalidFormat,
}

impl IntoResponse for CredentialError {
    fn into_response(self) -> Response {
        match self {
            CredentialError::Missing => normalize::missing_authorization().into_response(),
            CredentialError::InvalidFormat => {
                normalize::invalid_authorization_format().into_response()
            }
        }
    }
}

/// Extract the access token from an `Authorization` header value
///
/// - absent or empty → `Missing`
/// - non-ASCII, `Bearer` with no token, or another scheme with a
///   space-separated value (`Basic abc`) → `InvalidFormat`
/// - `Bearer <token>` → `<token>`
/// - anything else is taken as the bare token
pub fn parse_authorization(header: Option<&HeaderValue>) -> Result<String, CredentialError> {
    let Some(header) = header else {
        return Err(CredentialError::Missing);
    };

    let value = header
        .to_str()
        .map_err(|_| CredentialError::InvalidFormat)?
        .trim();

    if value.is_empty() {
        return Err(CredentialError::Missing);
    }

    let (scheme, rest) = match value.split_once(char::is_whitespace) {
        Some((scheme, rest)) => (scheme, Some(rest.trim())),
        None => (value, None),
    };

    if scheme.eq_ignore_ascii_case("bearer") {
        return match rest {
            Some(token) if !token.is_empty() && !token.contains(char::is_whitespace) => {
                Ok(token.to_string())
            }
            _ => Err(CredentialError::InvalidFormat),
        };
    }

    match rest {
        Some(_) => Err(CredentialError::InvalidFormat),
        None => Ok(value.to_string()),
    }
}

/// The access token for this request
///
/// Falls back to the configured default credential when the request carries
/// no `Authorization` header. `Debug` never prints the token.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

impl FromRequestParts<AppState> for AccessToken {
    type Rejection = CredentialError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let request_id = parts.extensions.get::<RequestId>().copied();

        match parse_authorization(parts.headers.get(AUTHORIZATION)) {
            Ok(token) => Ok(AccessToken(token)),
            Err(CredentialError::Missing) => match state.config().default_access_token() {
                Some(token) => {
                    tracing::debug!(
                        request_id = ?request_id.map(|r| r.to_string()),
                        "No Authorization header, using configured default access token"
                    );
                    Ok(AccessToken(token.to_string()))
                }
                None => {
                    tracing::info!(
                        request_id = ?request_id.map(|r| r.to_string()),
                        "Rejecting request without Authorization header"
                    );
                    Err(CredentialError::Missing)
                }
            },
            Err(e) => {
                tracing::info!(
                    request_id = ?request_id.map(|r| r.to_string()),
                    error = %e,
                    "Rejecting request with malformed Authorization header"
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: &str) -> Result<String, CredentialError> {
        parse_authorization(Some(&HeaderValue::from_str(value).unwrap()))
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(parse_authorization(None), Err(CredentialError::Missing));
    }

    #[test]
    fn test_empty_header_counts_as_missing() {
        assert_eq!(parse(""), Err(CredentialError::Missing));
        assert_eq!(parse("   "), Err(CredentialError::Missing));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(parse("Bearer abc123"), Ok("abc123".to_string()));
        assert_eq!(parse("bearer abc123"), Ok("abc123".to_string()));
    }

    #[test]
    fn test_bearer_without_token_is_invalid() {
        assert_eq!(parse("Bearer"), Err(CredentialError::InvalidFormat));
        assert_eq!(parse("Bearer    "), Err(CredentialError::InvalidFormat));
    }

    #[test]
    fn test_bare_token() {
        assert_eq!(parse("aoa-raw-token"), Ok("aoa-raw-token".to_string()));
    }

    #[test]
    fn test_other_scheme_is_invalid() {
        assert_eq!(parse("Basic dXNlcjpwYXNz"), Err(CredentialError::InvalidFormat));
        assert_eq!(parse("Bearer a b"), Err(CredentialError::InvalidFormat));
    }

    #[test]
    fn test_non_ascii_is_invalid() {
        let header = HeaderValue::from_bytes("Bearer tök".as_bytes()).unwrap();
        assert_eq!(
            parse_authorization(Some(&header)),
            Err(CredentialError::InvalidFormat)
        );
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken("secret".to_string());
        assert!(!format!("{:?}", token).contains("secret"));
        assert_eq!(token.as_str(), "secret");
    }
}
