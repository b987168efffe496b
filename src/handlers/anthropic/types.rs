//! Anthropic Messages API request shape and error envelope
//!
//! Pass-through requests are forwarded byte-for-byte, so the request type only
//! exists to reject bodies the backend could never accept.

use crate::handlers::openai::auth::CredentialError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const TYPE_INVALID_REQUEST: &str = "invalid_request_error";
pub const TYPE_AUTHENTICATION: &str = "authentication_error";
pub const TYPE_API_ERROR: &str = "api_error";

/// Messages API request, checked for shape and otherwise left untouched
///
/// Unknown fields are ignored. Known fields must have the right JSON type.
#[derive(Debug, Deserialize)]
pub struct MessagesRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<MessagesEntry>,
    #[serde(default)]
    pub max_tokens: Option<i64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub stream: Option<bool>,
}

/// One conversation turn
#[derive(Debug, Deserialize)]
pub struct MessagesEntry {
    pub role: String,
    #[serde(default)]
    pub content: Option<EntryContent>,
}

/// Either a plain string or a list of content blocks
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum EntryContent {
    Text(String),
    Blocks(Vec<serde_json::Value>),
}

/// Messages API error envelope: `{"type": "error", "error": {...}}`
#[derive(Debug, Serialize)]
pub struct AnthropicError {
    #[serde(skip)]
    status: StatusCode,
    #[serde(rename = "type")]
    envelope_type: &'static str,
    error: AnthropicErrorBody,
}

#[derive(Debug, Serialize)]
pub struct AnthropicErrorBody {
    #[serde(rename = "type")]
    pub error_type: &'static str,
    pub message: String,
}

impl AnthropicError {
    pub fn new(status: StatusCode, error_type: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            envelope_type: "error",
            error: AnthropicErrorBody {
                error_type,
                message: message.into(),
            },
        }
    }

    /// 400 for a body that is not a Messages API request
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, TYPE_INVALID_REQUEST, message)
    }

    /// Backend could not be reached or did not answer in time
    pub fn api_error(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(status, TYPE_API_ERROR, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn error_type(&self) -> &'static str {
        self.error.error_type
    }
}

impl From<CredentialError> for AnthropicError {
    fn from(error: CredentialError) -> Self {
        let message = match error {
            CredentialError::Missing => {
                "Missing API key. Provide an Authorization header or configure a default access token."
            }
            CredentialError::InvalidFormat => {
                "Invalid Authorization header format. Expected 'Bearer <token>'."
            }
        };
        Self::new(StatusCode::UNAUTHORIZED, TYPE_AUTHENTICATION, message)
    }
}

impl IntoResponse for AnthropicError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
