//! Anthropic Messages API pass-through

pub mod messages;
pub mod types;
