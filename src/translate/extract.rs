//! Assistant text extraction from backend payloads

use super::TEXT_PART_SEPARATOR;
use serde_json::Value;
use thiserror::Error;

/// Payload fields searched for assistant text, in priority order
pub const TEXT_FIELDS: [&str; 3] = ["message", "content", "text"];

/// Backend payload could not be read as a JSON object
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("backend payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("backend payload is a JSON {found}, expected an object")]
    NotAnObject { found: &'static str },
}

/// Extract the assistant text from a successful backend payload
///
/// Probes `message`, then `content`, then `text` and returns the first
/// non-empty one. A field may hold a string or an array of content blocks
/// (`[{"type": "text", "text": "..."}]`), whose texts are joined with
/// [`TEXT_PART_SEPARATOR`].
/// A payload whose fields are all missing or empty yields `""`.
///
/// # Errors
///
/// Returns [`ExtractionError`] only when the bytes are not a JSON object.
pub fn from_backend_payload(raw: &[u8]) -> Result<String, ExtractionError> {
    let value: Value = serde_json::from_slice(raw)?;
    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(ExtractionError::NotAnObject {
                found: json_kind(&other),
            });
        }
    };

    Ok(TEXT_FIELDS
        .iter()
        .filter_map(|field| object.get(*field))
        .filter_map(field_text)
        .find(|text| !text.is_empty())
        .unwrap_or_default())
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => Some(
            blocks
                .iter()
                .filter_map(|block| match block {
                    Value::String(text) => Some(text.as_str()),
                    Value::Object(fields) => fields.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join(TEXT_PART_SEPARATOR),
        ),
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
