//! OpenAI-compatible chat completions handler
//!
//! Handles POST /v1/chat/completions. The request is translated into every
//! configured backend shape, the negotiator finds one the backend accepts, and
//! the outcome is normalized back into an OpenAI response.

use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::normalize::{ClientResponse, normalize};
use crate::translate::{ConversationId, candidates_for};
use axum::{Extension, extract::State};

use super::auth::AccessToken;
use super::extractor::OpenAiJson;
use super::types::{ChatCompletionRequest, current_timestamp};

/// POST /v1/chat/completions handler
///
/// Credential checks run before the body is read, so a request without a
/// usable token never reaches the backend. `stream: true` is accepted but
/// answered with a single non-streamed completion.
///
/// # Response Format
///
/// On success, an OpenAI `chat.completion` whose `model` is the one the client
/// sent and whose `usage` is a fixed placeholder. On failure, the OpenAI error
/// envelope with the status chosen by the normalizer.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    token: AccessToken,
    OpenAiJson(request): OpenAiJson<ChatCompletionRequest>,
) -> ClientResponse {
    tracing::debug!(
        request_id = %request_id,
        model = %request.model(),
        messages_count = request.messages().len(),
        stream = request.stream(),
        "Received chat completions request"
    );

    if request.stream() {
        tracing::debug!(
            request_id = %request_id,
            "Streaming requested but not supported, answering with a single completion"
        );
    }

    let conversation_id = ConversationId::generate();
    let candidates = candidates_for(&state.config().negotiation.shapes, &request, &conversation_id);

    let outcome = state
        .negotiator()
        .negotiate(&candidates, token.as_str(), request_id)
        .await;

    let created = current_timestamp(Some(state.metrics().as_ref()), Some(&request_id));
    let response = normalize(&outcome, request.model(), created);

    match &response {
        ClientResponse::Success(completion) => tracing::info!(
            request_id = %request_id,
            conversation_id = %conversation_id,
            model = %completion.model,
            response_length = completion.choices[0].message.content.len(),
            "Chat completion successful"
        ),
        ClientResponse::Error { status, error } => tracing::warn!(
            request_id = %request_id,
            conversation_id = %conversation_id,
            status = status.as_u16(),
            code = ?error.code(),
            "Chat completion failed"
        ),
    }

    response
}
