//! Response and error normalization
//!
//! Turns a negotiation outcome into the single client-visible response:
//! an OpenAI chat completion on success, an OpenAI error envelope otherwise.
//! The response model is always the one the client asked for, never the
//! backend model name.

use crate::handlers::openai::extractor::OpenAiError;
use crate::handlers::openai::types::ChatCompletion;
use crate::negotiate::{BackendOutcome, Rejection};
use crate::translate::{ExtractionError, from_backend_payload};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub const CODE_MISSING_AUTHORIZATION: &str = "missing_authorization";
pub const CODE_INVALID_AUTHORIZATION_FORMAT: &str = "invalid_authorization_format";
pub const CODE_INVALID_TOKEN: &str = "invalid_token";
pub const CODE_BACKEND_ERROR: &str = "backend_error";
pub const CODE_BACKEND_TIMEOUT: &str = "backend_timeout";
pub const CODE_BACKEND_UNAVAILABLE: &str = "backend_unavailable";
pub const CODE_INVALID_BACKEND_RESPONSE: &str = "invalid_backend_response";

const MISSING_AUTHORIZATION_MESSAGE: &str = "Missing Authorization header. Set your Kiro access token as the api_key of your OpenAI client.";
const INVALID_AUTHORIZATION_FORMAT_MESSAGE: &str = "Invalid Authorization header format. Make sure the api_key of your OpenAI client is a valid Kiro access token.";
const INVALID_TOKEN_MESSAGE: &str = "Authentication failed. Check that the Kiro access token in api_key is correct and has not expired.";
const INVALID_TOKEN_DETAILS: &str = "Get a fresh access token from the Kiro IDE and use it as the api_key of your OpenAI client.";

/// The one response a client receives
#[derive(Debug, Clone)]
pub enum ClientResponse {
    Success(ChatCompletion),
    Error {
        status: StatusCode,
        error: OpenAiError,
    },
}

impl ClientResponse {
    fn error(status: StatusCode, error: OpenAiError) -> Self {
        ClientResponse::Error { status, error }
    }

    /// HTTP status this response is sent with
    pub fn status(&self) -> StatusCode {
        match self {
            ClientResponse::Success(_) => StatusCode::OK,
            ClientResponse::Error { status, .. } => *status,
        }
    }
}

impl IntoResponse for ClientResponse {
    fn into_response(self) -> Response {
        match self {
            ClientResponse::Success(completion) => (StatusCode::OK, Json(completion)).into_response(),
            ClientResponse::Error { status, error } => (status, Json(error)).into_response(),
        }
    }
}

/// Normalize a finished negotiation
///
/// `original_model` is echoed back verbatim; `created` is the response
/// timestamp in unix seconds.
pub fn normalize(outcome: &BackendOutcome, original_model: &str, created: i64) -> ClientResponse {
    match outcome {
        BackendOutcome::Accepted { body, .. } => {
            match normalize_success(body, original_model, created) {
                Ok(completion) => ClientResponse::Success(completion),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        body_len = body.len(),
                        "Backend accepted the request but its response could not be read"
                    );
                    ClientResponse::error(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        OpenAiError::server_error(
                            format!("Failed to parse backend response: {}", e),
                            Some(CODE_INVALID_BACKEND_RESPONSE),
                        ),
                    )
                }
            }
        }
        BackendOutcome::Rejected(rejection) => normalize_failure(rejection),
    }
}

/// Build a chat completion from an accepted backend body
///
/// # Errors
///
/// Returns an error if the body is not a JSON object.
pub fn normalize_success(
    body: &[u8],
    original_model: &str,
    created: i64,
) -> Result<ChatCompletion, ExtractionError> {
    let content = from_backend_payload(body)?;
    Ok(ChatCompletion::new(
        content,
        original_model.to_string(),
        created,
    ))
}

/// Map the final rejection of a negotiation to an error envelope
pub fn normalize_failure(rejection: &Rejection) -> ClientResponse {
    match rejection {
        Rejection::Status { .. } if rejection.is_auth_failure() => invalid_token(),
        Rejection::Status { status, .. } if status.as_u16() >= 400 => ClientResponse::error(
            *status,
            OpenAiError::api_error(
                format!("Kiro API error, status code: {}", status.as_u16()),
                CODE_BACKEND_ERROR,
            ),
        ),
        Rejection::Status { status, .. } => ClientResponse::error(
            StatusCode::BAD_GATEWAY,
            OpenAiError::api_error(
                format!(
                    "Kiro API returned unexpected status code: {}",
                    status.as_u16()
                ),
                CODE_BACKEND_ERROR,
            ),
        ),
        Rejection::Timeout => ClientResponse::error(
            StatusCode::GATEWAY_TIMEOUT,
            OpenAiError::api_error("Kiro API request timed out", CODE_BACKEND_TIMEOUT),
        ),
        Rejection::Transport(reason) => ClientResponse::error(
            StatusCode::BAD_GATEWAY,
            OpenAiError::api_error(
                format!("Failed to reach Kiro API: {}", reason),
                CODE_BACKEND_UNAVAILABLE,
            ),
        ),
        Rejection::NoAttempts => ClientResponse::error(
            StatusCode::BAD_GATEWAY,
            OpenAiError::api_error("No request format left to try", CODE_BACKEND_ERROR),
        ),
        Rejection::InvalidCandidate(reason) => ClientResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            OpenAiError::server_error(
                format!("Failed to build Kiro request: {}", reason),
                Some(CODE_BACKEND_ERROR),
            ),
        ),
    }
}

/// 401 for a request with no credential at all
pub fn missing_authorization() -> ClientResponse {
    ClientResponse::error(
        StatusCode::UNAUTHORIZED,
        OpenAiError::authentication(MISSING_AUTHORIZATION_MESSAGE, CODE_MISSING_AUTHORIZATION),
    )
}

/// 401 for an Authorization header that does not yield a token
pub fn invalid_authorization_format() -> ClientResponse {
    ClientResponse::error(
        StatusCode::UNAUTHORIZED,
        OpenAiError::authentication(
            INVALID_AUTHORIZATION_FORMAT_MESSAGE,
            CODE_INVALID_AUTHORIZATION_FORMAT,
        ),
    )
}

/// 401 when the backend refused the token
pub fn invalid_token() -> ClientResponse {
    ClientResponse::error(
        StatusCode::UNAUTHORIZED,
        OpenAiError::authentication(INVALID_TOKEN_MESSAGE, CODE_INVALID_TOKEN)
            .with_details(INVALID_TOKEN_DETAILS),
    )
}
