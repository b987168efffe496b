//! kiroproxy - OpenAI-compatible proxy for the Kiro assistant backend
//!
//! The backend's request contract is undocumented and unstable, so each chat
//! completion is translated into several candidate request shapes and the
//! backend is tried with each until one is accepted. The accepted answer is normalized
//! back into an OpenAI chat completion.
//!
//! Anthropic Messages API requests on `/v1/messages` skip negotiation and are
//! forwarded to the backend unchanged.

pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod negotiate;
pub mod normalize;
pub mod telemetry;
pub mod translate;
