//! OpenAI-compatible models list handler
//!
//! Handles GET /v1/models requests.

use crate::handlers::AppState;
use axum::{Json, extract::State, response::IntoResponse};

use super::types::{ModelObject, ModelsListResponse, current_timestamp};

/// Owner reported for every listed model
pub const MODEL_OWNER: &str = "kiro";

/// Models the backend is known to serve
pub const AVAILABLE_MODELS: [&str; 2] = ["claude-sonnet-4-20250514", "claude-3-7-sonnet-20250219"];

/// GET /v1/models handler
///
/// Returns a fixed list in OpenAI format, stamped with the current time. The
/// list is advisory: any `model` string is accepted by the completions
/// endpoint and echoed back.
pub async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    let created = current_timestamp(Some(state.metrics().as_ref()), None);
    let models = AVAILABLE_MODELS
        .iter()
        .map(|id| ModelObject::new(*id, MODEL_OWNER, created))
        .collect();

    Json(ModelsListResponse::new(models))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_object() {
        let model = ModelObject::new("claude-sonnet-4-20250514", MODEL_OWNER, 42);
        assert_eq!(model.id, "claude-sonnet-4-20250514");
        assert_eq!(model.object, "model");
        assert_eq!(model.owned_by, "kiro");
        assert_eq!(model.created, 42);
    }

    #[test]
    fn test_default_model_is_listed() {
        assert!(AVAILABLE_MODELS.contains(&crate::translate::DEFAULT_BACKEND_MODEL));
    }
}
