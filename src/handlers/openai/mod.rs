//! OpenAI-compatible API handlers
//!
//! Provides OpenAI-compatible endpoints for kiroproxy:
//! - `POST /v1/chat/completions` - Chat completions (non-streaming)
//! - `GET /v1/models` - List available models

pub mod auth;
pub mod completions;
pub mod extractor;
pub mod models;
pub mod types;
