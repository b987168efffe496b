//! Schema translation between the OpenAI chat schema and the backend
//!
//! Translation is pure and side-effect free, and depends on nothing outside
//! this module:
//! - [`ChatCompletionRequest`] is the validated inbound request
//! - [`to_backend_candidates`] turns one client request into the ordered list
//!   of backend bodies the negotiator will try
//! - [`from_backend_payload`] pulls the assistant text out of whatever the
//!   backend answered with

pub mod candidates;
pub mod extract;
pub mod request;

/// Separator used whenever several text parts collapse into one string
///
/// Applies to inbound content parts and to backend content blocks alike.
pub const TEXT_PART_SEPARATOR: &str = "\n";

pub use candidates::{
    CandidateBody, CandidateShape, ConversationId, DEFAULT_BACKEND_MODEL, candidates_for,
    to_backend_candidates,
};
pub use extract::{ExtractionError, from_backend_payload};
pub use request::{ChatCompletionRequest, ChatCompletionRequestBuilder, ChatMessage, MessageRole};
