//! OpenAI error envelope and a JSON extractor that produces it
//!
//! Every client-facing failure on the `/v1` surface uses the envelope OpenAI
//! SDKs parse:
//! ```json
//! {
//!   "error": {
//!     "message": "...",
//!     "type": "invalid_request_error",
//!     "param": null,
//!     "code": null
//!   }
//! }
//! ```
//! Authentication failures additionally carry a `details` string.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

pub const TYPE_INVALID_REQUEST: &str = "invalid_request_error";
pub const TYPE_AUTHENTICATION: &str = "authentication_error";
pub const TYPE_API_ERROR: &str = "api_error";
pub const TYPE_SERVER_ERROR: &str = "server_error";

/// OpenAI-compatible error response structure
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpenAiError {
    pub error: OpenAiErrorBody,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OpenAiErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl OpenAiError {
    fn new(message: impl Into<String>, error_type: &str, code: Option<&str>) -> Self {
        Self {
            error: OpenAiErrorBody {
                message: message.into(),
                error_type: error_type.to_string(),
                param: None,
                code: code.map(str::to_string),
                details: None,
            },
        }
    }

    /// Create a new OpenAI-formatted error for invalid requests
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(message, TYPE_INVALID_REQUEST, None)
    }

    /// Credential problem, either inbound or reported by the backend
    pub fn authentication(message: impl Into<String>, code: &str) -> Self {
        Self::new(message, TYPE_AUTHENTICATION, Some(code))
    }

    /// Attach a remediation hint
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error.details = Some(details.into());
        self
    }

    /// The backend refused every attempt
    pub fn api_error(message: impl Into<String>, code: &str) -> Self {
        Self::new(message, TYPE_API_ERROR, Some(code))
    }

    /// Failure on our side of the proxy
    pub fn server_error(message: impl Into<String>, code: Option<&str>) -> Self {
        Self::new(message, TYPE_SERVER_ERROR, code)
    }

    /// Machine-readable code, if any
    pub fn code(&self) -> Option<&str> {
        self.error.code.as_deref()
    }
}

/// OpenAI-compatible JSON extraction error
///
/// Status depends on the rejection:
/// - JSON syntax errors → 400 Bad Request
/// - Data validation errors → 422 Unprocessable Entity
/// - Missing content type → 415 Unsupported Media Type
pub struct OpenAiJsonRejection(JsonRejection);

impl IntoResponse for OpenAiJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            JsonRejection::JsonSyntaxError(_) => (StatusCode::BAD_REQUEST, self.0.body_text()),
            JsonRejection::JsonDataError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json".to_string(),
            ),
            _ => (StatusCode::BAD_REQUEST, self.0.body_text()),
        };
        tracing::debug!(status = status.as_u16(), error = %message, "Rejected request body");
        let error = OpenAiError::invalid_request(message);
        (status, Json(error)).into_response()
    }
}

/// Custom JSON extractor that produces OpenAI-compatible error responses
///
/// Use this instead of `axum::Json` in `/v1` handlers.
pub struct OpenAiJson<T>(pub T);

impl<S, T> FromRequest<S> for OpenAiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = OpenAiJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(OpenAiJson(value)),
            Err(rejection) => Err(OpenAiJsonRejection(rejection)),
        }
    }
}

/// 405 for a `/v1` route hit with the wrong method
pub async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(OpenAiError::invalid_request("Method not allowed")),
    )
        .into_response()
}
