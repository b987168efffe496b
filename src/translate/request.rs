//! Inbound chat request model
//!
//! The validated OpenAI-style request that translation consumes. Validation
//! is enforced during deserialization - invalid instances cannot exist.

use super::TEXT_PART_SEPARATOR;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Shared Validation Logic
// =============================================================================

/// Validate ChatCompletionRequest fields
///
/// Single source of truth for the builder and the serde deserializer.
fn validate_request_fields(temperature: Option<f64>) -> Result<(), String> {
    if let Some(temp) = temperature {
        if temp.is_nan() || temp.is_infinite() {
            return Err("temperature must be a finite number".to_string());
        }
        if !(0.0..=2.0).contains(&temp) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
    }

    Ok(())
}

// =============================================================================
// Message Types
// =============================================================================

/// Message role in the conversation
///
/// Roles other than the three well-known ones are preserved verbatim so they
/// can be forwarded to the backend role-for-role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageRole {
    System,
    User,
    Assistant,
    Other(String),
}

impl MessageRole {
    /// Wire representation of the role
    pub fn as_str(&self) -> &str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Other(raw) => raw,
        }
    }
}

impl From<&str> for MessageRole {
    fn from(raw: &str) -> Self {
        match raw {
            "system" => MessageRole::System,
            "user" => MessageRole::User,
            "assistant" => MessageRole::Assistant,
            other => MessageRole::Other(other.to_string()),
        }
    }
}

impl Serialize for MessageRole {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageRole {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(MessageRole::from(raw.as_str()))
    }
}

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    role: MessageRole,
    content: String,
}

impl ChatMessage {
    /// Create a new message
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Get the role
    pub fn role(&self) -> &MessageRole {
        &self.role
    }

    /// Get the content
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl<'de> Deserialize<'de> for ChatMessage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // OpenAI clients send either a plain string or an array of content
        // parts; null shows up on assistant messages that only carried tool calls.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawContent {
            Text(String),
            Parts(Vec<RawPart>),
        }

        #[derive(Deserialize)]
        struct RawPart {
            #[serde(default)]
            text: Option<String>,
        }

        #[derive(Deserialize)]
        struct RawMessage {
            role: MessageRole,
            #[serde(default)]
            content: Option<RawContent>,
        }

        let raw = RawMessage::deserialize(deserializer)?;
        let content = match raw.content {
            None => String::new(),
            Some(RawContent::Text(text)) => text,
            Some(RawContent::Parts(parts)) => parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join(TEXT_PART_SEPARATOR),
        };

        Ok(ChatMessage {
            role: raw.role,
            content,
        })
    }
}

// =============================================================================
// Chat Completion Request
// =============================================================================

/// OpenAI-compatible chat completion request
///
/// Validation is enforced during deserialization - invalid instances cannot exist.
/// Use [`ChatCompletionRequest::builder()`] for programmatic construction in tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Builder for constructing [`ChatCompletionRequest`] programmatically
///
/// Performs the same validation as JSON deserialization.
///
/// # Examples
///
/// ```
/// use kiroproxy::translate::ChatCompletionRequest;
///
/// let request = ChatCompletionRequest::builder()
///     .model("claude-sonnet-4-20250514")
///     .system_message("You are helpful.")
///     .user_message("Hello!")
///     .temperature(0.7)
///     .build()
///     .expect("valid request");
/// assert_eq!(request.messages().len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ChatCompletionRequestBuilder {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: Option<f64>,
    max_tokens: Option<u32>,
}

impl ChatCompletionRequestBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client-facing model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add a single message to the request
    pub fn message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    /// Add a system message
    pub fn system_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::System, content))
    }

    /// Add a user message
    pub fn user_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::User, content))
    }

    /// Add an assistant message
    pub fn assistant_message(self, content: impl Into<String>) -> Self {
        self.message(ChatMessage::new(MessageRole::Assistant, content))
    }

    /// Request streaming (accepted, answered non-streamed)
    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Set the temperature (0.0 to 2.0)
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum output tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build the request, performing all validation
    ///
    /// # Errors
    /// Returns an error string if validation fails (same rules as JSON deserialization)
    pub fn build(self) -> Result<ChatCompletionRequest, String> {
        validate_request_fields(self.temperature)?;

        Ok(ChatCompletionRequest {
            model: self.model,
            messages: self.messages,
            stream: self.stream,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}

impl ChatCompletionRequest {
    /// Create a new builder for constructing a request programmatically
    pub fn builder() -> ChatCompletionRequestBuilder {
        ChatCompletionRequestBuilder::new()
    }

    /// Get the client-supplied model identifier (may be empty)
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the messages in dialogue order
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Check if streaming was requested
    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Get temperature if set
    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }

    /// Get max_tokens if set
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Get the content of the last user message, scanning from the end
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| *m.role() == MessageRole::User)
            .map(|m| m.content())
    }
}

impl<'de> Deserialize<'de> for ChatCompletionRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawRequest {
            #[serde(default)]
            model: String,
            messages: Vec<ChatMessage>,
            #[serde(default)]
            stream: bool,
            temperature: Option<f64>,
            max_tokens: Option<u32>,
        }

        let raw = RawRequest::deserialize(deserializer)?;

        validate_request_fields(raw.temperature).map_err(serde::de::Error::custom)?;

        Ok(ChatCompletionRequest {
            model: raw.model,
            messages: raw.messages,
            stream: raw.stream,
            temperature: raw.temperature,
            max_tokens: raw.max_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // MessageRole Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_message_role_deserialize_known_roles() {
        assert_eq!(
            serde_json::from_str::<MessageRole>(r#""user""#).unwrap(),
            MessageRole::User
        );
        assert_eq!(
            serde_json::from_str::<MessageRole>(r#""assistant""#).unwrap(),
            MessageRole::Assistant
        );
        assert_eq!(
            serde_json::from_str::<MessageRole>(r#""system""#).unwrap(),
            MessageRole::System
        );
    }

    #[test]
    fn test_message_role_preserves_unknown_role() {
        let role: MessageRole = serde_json::from_str(r#""tool""#).unwrap();
        assert_eq!(role, MessageRole::Other("tool".to_string()));
        assert_eq!(serde_json::to_string(&role).unwrap(), r#""tool""#);
    }

    // -------------------------------------------------------------------------
    // ChatMessage Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_chat_message_deserialize_string_content() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "user", "content": "Hello"}"#).unwrap();
        assert_eq!(*msg.role(), MessageRole::User);
        assert_eq!(msg.content(), "Hello");
    }

    #[test]
    fn test_chat_message_flattens_content_parts() {
        let msg: ChatMessage = serde_json::from_str(
            r#"{"role": "user", "content": [{"type": "text", "text": "one"}, {"type": "text", "text": "two"}]}"#,
        )
        .unwrap();
        assert_eq!(msg.content(), "one\ntwo");
    }

    #[test]
    fn test_chat_message_null_content_is_empty() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role": "assistant", "content": null}"#).unwrap();
        assert_eq!(msg.content(), "");
    }

    // -------------------------------------------------------------------------
    // ChatCompletionRequest Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_request_deserialize_minimal() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{"model": "m", "messages": [{"role": "user", "content": "Hi"}]}"#,
        )
        .unwrap();
        assert_eq!(request.model(), "m");
        assert_eq!(request.messages().len(), 1);
        assert!(!request.stream());
        assert!(request.temperature().is_none());
        assert!(request.max_tokens().is_none());
    }

    #[test]
    fn test_request_deserialize_with_options() {
        let request: ChatCompletionRequest = serde_json::from_str(
            r#"{"model": "m", "messages": [], "stream": true, "temperature": 0.5, "max_tokens": 64}"#,
        )
        .unwrap();
        assert!(request.stream());
        assert_eq!(request.temperature(), Some(0.5));
        assert_eq!(request.max_tokens(), Some(64));
    }

    #[test]
    fn test_request_missing_model_defaults_to_empty() {
        let request: ChatCompletionRequest =
            serde_json::from_str(r#"{"messages": [{"role": "user", "content": "Hi"}]}"#).unwrap();
        assert_eq!(request.model(), "");
    }

    #[test]
    fn test_request_rejects_invalid_temperature() {
        let result = serde_json::from_str::<ChatCompletionRequest>(
            r#"{"model": "m", "messages": [], "temperature": 2.5}"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("temperature"), "got: {}", err);
    }

    #[test]
    fn test_request_rejects_negative_max_tokens() {
        let result = serde_json::from_str::<ChatCompletionRequest>(
            r#"{"model": "m", "messages": [], "max_tokens": -1}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_applies_same_validation() {
        let result = ChatCompletionRequest::builder().temperature(-0.1).build();
        assert!(result.is_err());

        let result = ChatCompletionRequest::builder()
            .temperature(f64::NAN)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_last_user_content_scans_from_end() {
        let request = ChatCompletionRequest::builder()
            .user_message("a")
            .assistant_message("b")
            .user_message("c")
            .build()
            .unwrap();
        assert_eq!(request.last_user_content(), Some("c"));
    }

    #[test]
    fn test_last_user_content_none_without_user_messages() {
        let request = ChatCompletionRequest::builder()
            .assistant_message("b")
            .build()
            .unwrap();
        assert_eq!(request.last_user_content(), None);
    }
}
