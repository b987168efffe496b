//! Anthropic Messages pass-through handler
//!
//! Handles POST /v1/messages. The body is checked for shape, then forwarded
//! unchanged to the backend with a Bearer credential. Whatever the backend
//! answers is returned as-is; no negotiation or normalization happens here.

use crate::handlers::AppState;
use crate::handlers::openai::auth::{AccessToken, CredentialError};
use crate::metrics::PassthroughOutcome;
use crate::middleware::RequestId;
use crate::negotiate::{ContentType, CredentialKind, OutboundRequest, TransportError};
use axum::{
    Extension,
    extract::State,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;

use super::types::{AnthropicError, MessagesRequest};

/// POST /v1/messages handler
///
/// Credentials are checked before the body. The backend's status and body
/// are relayed verbatim with `Content-Type: application/json`. A timeout is
/// 504 and a connection failure 502, both in the Messages API error envelope.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    token: Result<AccessToken, CredentialError>,
    body: Bytes,
) -> Response {
    let token = match token {
        Ok(token) => token,
        Err(e) => return AnthropicError::from(e).into_response(),
    };

    let request: MessagesRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::info!(
                request_id = %request_id,
                error = %e,
                "Rejecting unparseable messages request"
            );
            return AnthropicError::invalid_request(format!("Failed to parse request: {}", e))
                .into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        model = %request.model,
        messages_count = request.messages.len(),
        stream = request.stream.unwrap_or(false),
        body_len = body.len(),
        "Forwarding messages request"
    );

    let outbound = OutboundRequest {
        body: body.to_vec(),
        content_type: ContentType::Json,
        authorization: CredentialKind::Bearer.encode(token.as_str()).header_value(),
    };

    match state.passthrough().send(outbound).await {
        Ok(response) => {
            state.metrics().record_passthrough(PassthroughOutcome::Forwarded);
            tracing::info!(
                request_id = %request_id,
                status = response.status.as_u16(),
                response_len = response.body.len(),
                "Messages request forwarded"
            );
            (
                response.status,
                [(CONTENT_TYPE, "application/json")],
                response.body,
            )
                .into_response()
        }
        Err(e) => {
            let (outcome, status) = match &e {
                TransportError::Timeout(_) => {
                    (PassthroughOutcome::Timeout, StatusCode::GATEWAY_TIMEOUT)
                }
                _ => (PassthroughOutcome::Unavailable, StatusCode::BAD_GATEWAY),
            };
            state.metrics().record_passthrough(outcome);
            tracing::warn!(
                request_id = %request_id,
                endpoint = %state.passthrough().endpoint(),
                error = %e,
                "Messages pass-through failed"
            );
            AnthropicError::api_error(status, format!("Proxy request failed: {}", e))
                .into_response()
        }
    }
}

/// Fallback for non-POST methods on /v1/messages
pub async fn method_not_allowed() -> Response {
    AnthropicError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        super::types::TYPE_INVALID_REQUEST,
        "Only POST requests are supported",
    )
    .into_response()
}
