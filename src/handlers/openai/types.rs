//! OpenAI-compatible request and response types
//!
//! These types follow the OpenAI Chat Completions API. The request side lives
//! in [`crate::translate::request`] and is re-exported here.

use serde::{Deserialize, Serialize};

pub use crate::translate::request::{
    ChatCompletionRequest, ChatCompletionRequestBuilder, ChatMessage, MessageRole,
};

// =============================================================================
// OpenAI API Object Type Constants
// =============================================================================

/// Object type for non-streaming chat completion responses
pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";
/// Object type for list responses (e.g., model list)
pub const OBJECT_LIST: &str = "list";
/// Object type for individual model entries
pub const OBJECT_MODEL: &str = "model";

/// Placeholder prompt token count reported in every response
pub const PLACEHOLDER_PROMPT_TOKENS: u32 = 100;
/// Placeholder completion token count reported in every response
pub const PLACEHOLDER_COMPLETION_TOKENS: u32 = 200;

// =============================================================================
// Chat Completion Response
// =============================================================================

/// Finish reason for a completion
///
/// The backend reports no stop reason, so every completion ends with `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
}

/// Usage statistics for a chat completion response.
///
/// Fields are private to enforce the invariant that `total_tokens` always
/// equals `prompt_tokens + completion_tokens`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl Usage {
    /// Create usage stats from token counts.
    #[inline]
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Fixed counters reported for every completion.
    ///
    /// The backend does not report token usage, so these are constants rather
    /// than counts.
    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_PROMPT_TOKENS, PLACEHOLDER_COMPLETION_TOKENS)
    }

    /// Returns the number of tokens in the prompt.
    #[inline]
    pub fn prompt_tokens(&self) -> u32 {
        self.prompt_tokens
    }

    /// Returns the number of tokens in the completion.
    #[inline]
    pub fn completion_tokens(&self) -> u32 {
        self.completion_tokens
    }

    /// Returns the total number of tokens (prompt + completion).
    #[inline]
    pub fn total_tokens(&self) -> u32 {
        self.total_tokens
    }
}

/// Assistant message in response
#[derive(Debug, Clone, Serialize)]
pub struct AssistantMessage {
    pub role: MessageRole,
    pub content: String,
}

impl AssistantMessage {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A single choice in the response
#[derive(Debug, Clone, Serialize)]
pub struct Choice {
    pub index: u32,
    pub message: AssistantMessage,
    pub finish_reason: FinishReason,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Usage,
}

impl ChatCompletion {
    /// Create a new chat completion response
    ///
    /// # Arguments
    /// * `content` - The assistant's response content
    /// * `model_name` - Model identifier echoed back to the client
    /// * `created` - Unix timestamp when the completion was created (use `current_timestamp()` helper)
    pub fn new(content: String, model_name: String, created: i64) -> Self {
        let id = format!("chatcmpl-{}", uuid::Uuid::new_v4().simple());

        Self {
            id,
            object: OBJECT_CHAT_COMPLETION.to_string(),
            created,
            model: model_name,
            choices: vec![Choice {
                index: 0,
                message: AssistantMessage::new(content),
                finish_reason: FinishReason::Stop,
            }],
            usage: Usage::placeholder(),
        }
    }
}

/// Get the current Unix timestamp for response creation.
///
/// Returns the current time as seconds since UNIX epoch. If the system clock
/// is misconfigured (before UNIX epoch), returns 0 and logs a warning.
///
/// # Arguments
/// * `metrics` - Optional metrics to track clock errors for observability
/// * `request_id` - Optional request ID for log correlation
pub fn current_timestamp(
    metrics: Option<&crate::metrics::Metrics>,
    request_id: Option<&crate::middleware::RequestId>,
) -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_else(|e| {
            if let Some(rid) = request_id {
                tracing::warn!(
                    request_id = %rid,
                    error = %e,
                    "System clock appears to be before UNIX epoch - using 0 as timestamp"
                );
            } else {
                tracing::warn!(
                    error = %e,
                    "System clock appears to be before UNIX epoch - using 0 as timestamp"
                );
            }
            if let Some(m) = metrics {
                m.clock_error();
            }
            0
        })
}

// =============================================================================
// Models List Response
// =============================================================================

/// A model object for the models list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelObject {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub owned_by: String,
}

impl ModelObject {
    /// Create a new model object
    pub fn new(id: impl Into<String>, owned_by: impl Into<String>, created: i64) -> Self {
        Self {
            id: id.into(),
            object: OBJECT_MODEL.to_string(),
            created,
            owned_by: owned_by.into(),
        }
    }
}

/// Response for GET /v1/models
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsListResponse {
    pub object: String,
    pub data: Vec<ModelObject>,
}

impl ModelsListResponse {
    /// Create a models list response
    pub fn new(models: Vec<ModelObject>) -> Self {
        Self {
            object: OBJECT_LIST.to_string(),
            data: models,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
