//! Candidate backend request bodies
//!
//! The backend's accepted request shape is not pinned, so a client request is
//! translated into every shape in the strategy table. Each [`CandidateShape`]
//! maps to exactly one [`CandidateBody`] variant; adding a shape means adding a
//! table entry and a body type, the negotiator never changes.

use super::request::ChatCompletionRequest;
use serde::{Deserialize, Serialize};

/// Model sent to the backend when the client did not name one
pub const DEFAULT_BACKEND_MODEL: &str = "claude-sonnet-4-20250514";

/// Conversation identifier carried by the native candidate
///
/// Generated once per translation so that all candidates of one request share
/// it, and passed into translation so that translation itself stays
/// deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationId(String);

impl ConversationId {
    /// Generate a fresh identifier (`conv_` + UUID v4)
    pub fn generate() -> Self {
        Self(format!("conv_{}", uuid::Uuid::new_v4().simple()))
    }

    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy-table key naming one backend request shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateShape {
    /// Conversation-id keyed body with the full message list
    Native,
    /// Message list under `chatMessages` with model-id style fields
    CodeAssistant,
    /// Only the last user message as a single `input` string
    SingleInput,
    /// Long-form `max_tokens` fields, third-party messages convention
    GenericMessages,
}

impl CandidateShape {
    /// Every known shape in negotiation order
    pub const ALL: [CandidateShape; 4] = [
        CandidateShape::Native,
        CandidateShape::CodeAssistant,
        CandidateShape::SingleInput,
        CandidateShape::GenericMessages,
    ];

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateShape::Native => "native",
            CandidateShape::CodeAssistant => "code_assistant",
            CandidateShape::SingleInput => "single_input",
            CandidateShape::GenericMessages => "generic_messages",
        }
    }

    /// Build the body of this shape for a request
    pub fn build(
        self,
        request: &ChatCompletionRequest,
        conversation_id: &ConversationId,
    ) -> CandidateBody {
        match self {
            CandidateShape::Native => CandidateBody::Native(NativeConversationBody {
                conversation_id: conversation_id.as_str().to_string(),
                messages: backend_messages(request),
                model: backend_model(request),
                max_tokens: non_zero_tokens(request.max_tokens()),
                temperature: non_zero_temperature(request.temperature()),
            }),
            CandidateShape::CodeAssistant => CandidateBody::CodeAssistant(CodeAssistantBody {
                chat_messages: backend_messages(request),
                model_id: Some(request.model())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string),
                max_output_tokens: non_zero_tokens(request.max_tokens()),
                temperature: non_zero_temperature(request.temperature()),
            }),
            CandidateShape::SingleInput => CandidateBody::SingleInput(SingleInputBody {
                input: request.last_user_content().unwrap_or_default().to_string(),
                model: backend_model(request),
                max_output_tokens: non_zero_tokens(request.max_tokens()),
            }),
            CandidateShape::GenericMessages => {
                CandidateBody::GenericMessages(GenericMessagesBody {
                    model: backend_model(request),
                    messages: backend_messages(request),
                    max_tokens: request.max_tokens(),
                    temperature: request.temperature(),
                })
            }
        }
    }
}

impl std::fmt::Display for CandidateShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message as forwarded to the backend, role-for-role
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendMessage {
    pub role: String,
    pub content: String,
}

/// Body for [`CandidateShape::Native`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeConversationBody {
    pub conversation_id: String,
    pub messages: Vec<BackendMessage>,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Body for [`CandidateShape::CodeAssistant`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeAssistantBody {
    pub chat_messages: Vec<BackendMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// Body for [`CandidateShape::SingleInput`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleInputBody {
    pub input: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

/// Body for [`CandidateShape::GenericMessages`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenericMessagesBody {
    pub model: String,
    pub messages: Vec<BackendMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

/// One guessed backend request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CandidateBody {
    Native(NativeConversationBody),
    CodeAssistant(CodeAssistantBody),
    SingleInput(SingleInputBody),
    GenericMessages(GenericMessagesBody),
}

impl CandidateBody {
    /// The shape this body was built from
    pub fn shape(&self) -> CandidateShape {
        match self {
            CandidateBody::Native(_) => CandidateShape::Native,
            CandidateBody::CodeAssistant(_) => CandidateShape::CodeAssistant,
            CandidateBody::SingleInput(_) => CandidateShape::SingleInput,
            CandidateBody::GenericMessages(_) => CandidateShape::GenericMessages,
        }
    }

    /// Serialize to the JSON bytes sent on the wire
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Translate a request into every known candidate, in table order
pub fn to_backend_candidates(
    request: &ChatCompletionRequest,
    conversation_id: &ConversationId,
) -> Vec<CandidateBody> {
    candidates_for(&CandidateShape::ALL, request, conversation_id)
}

/// Translate a request into the given shapes, preserving their order
pub fn candidates_for(
    shapes: &[CandidateShape],
    request: &ChatCompletionRequest,
    conversation_id: &ConversationId,
) -> Vec<CandidateBody> {
    shapes
        .iter()
        .map(|shape| shape.build(request, conversation_id))
        .collect()
}

fn backend_messages(request: &ChatCompletionRequest) -> Vec<BackendMessage> {
    request
        .messages()
        .iter()
        .map(|m| BackendMessage {
            role: m.role().as_str().to_string(),
            content: m.content().to_string(),
        })
        .collect()
}

fn backend_model(request: &ChatCompletionRequest) -> String {
    if request.model().is_empty() {
        DEFAULT_BACKEND_MODEL.to_string()
    } else {
        request.model().to_string()
    }
}

fn non_zero_tokens(value: Option<u32>) -> Option<u32> {
    value.filter(|v| *v != 0)
}

fn non_zero_temperature(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}
