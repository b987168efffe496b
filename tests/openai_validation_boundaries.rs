//! Request validation tests for /v1/chat/completions
//!
//! Malformed bodies are rejected before negotiation with the OpenAI error
//! envelope: 400 for JSON syntax, 422 for schema and range problems, 415 for a
//! missing JSON content type. Accepted values go on to the backend, which here
//! is unreachable, so "accepted" means anything other than 400/415/422.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use kiroproxy::{
    config::Config,
    handlers::{AppState, build_router},
    negotiate::{ContentType, CredentialKind},
    translate::CandidateShape,
};
use std::sync::Arc;
use tower::ServiceExt;

/// App whose single pinned attempt goes to a closed port
fn create_test_app() -> Router {
    let mut config = Config::default();
    config.backend.url = "http://127.0.0.1:9/generateAssistantResponse".to_string();
    config.backend.attempt_timeout_seconds = 1;
    config.negotiation.shapes = vec![CandidateShape::Native];
    config.negotiation.credentials = vec![CredentialKind::Bearer];
    config.negotiation.content_types = vec![ContentType::Json];

    let state = AppState::new(Arc::new(config)).expect("AppState::new should succeed");
    build_router(state)
}

async fn send(content_type: Option<&str>, body: &str) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/v1/chat/completions")
        .header("authorization", "Bearer tok");
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }

    let response = create_test_app()
        .oneshot(builder.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn make_request_with_param(param_json: &str) -> (StatusCode, serde_json::Value) {
    let body = format!(
        r#"{{"model": "m", "messages": [{{"role": "user", "content": "Hello"}}], {}}}"#,
        param_json
    );
    send(Some("application/json"), &body).await
}

async fn assert_value_accepted(param_json: &str, description: &str) {
    let (status, body) = make_request_with_param(param_json).await;
    assert!(
        !matches!(
            status,
            StatusCode::BAD_REQUEST
                | StatusCode::UNPROCESSABLE_ENTITY
                | StatusCode::UNSUPPORTED_MEDIA_TYPE
        ),
        "{} should be accepted. Got status: {}, body: {}",
        description,
        status,
        body
    );
}

async fn assert_value_rejected(param_json: &str, expected_error_term: &str, description: &str) {
    let (status, body) = make_request_with_param(param_json).await;
    assert_eq!(
        status,
        StatusCode::UNPROCESSABLE_ENTITY,
        "{} should return 422. Got body: {}",
        description,
        body
    );
    assert_eq!(body["error"]["type"], "invalid_request_error");
    let message = body["error"]["message"].as_str().unwrap_or_default();
    assert!(
        message
            .to_lowercase()
            .contains(&expected_error_term.to_lowercase()),
        "{} error should mention '{}'. Got: {}",
        description,
        expected_error_term,
        message
    );
}

// -------------------------------------------------------------------------
// Temperature Boundary Tests [0.0, 2.0]
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_temperature_at_bounds_is_accepted() {
    assert_value_accepted(r#""temperature": 0.0"#, "temperature 0.0").await;
    assert_value_accepted(r#""temperature": 2.0"#, "temperature 2.0").await;
}

#[tokio::test]
async fn test_temperature_outside_bounds_is_rejected() {
    assert_value_rejected(r#""temperature": -0.01"#, "temperature", "temperature -0.01").await;
    assert_value_rejected(r#""temperature": 2.01"#, "temperature", "temperature 2.01").await;
}

// -------------------------------------------------------------------------
// max_tokens
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_max_tokens_values() {
    assert_value_accepted(r#""max_tokens": 0"#, "max_tokens 0").await;
    assert_value_accepted(r#""max_tokens": 4096"#, "max_tokens 4096").await;
    assert_value_rejected(r#""max_tokens": -1"#, "max_tokens", "max_tokens -1").await;
}

// -------------------------------------------------------------------------
// Body shape
// -------------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_json_is_400() {
    let (status, body) = send(Some("application/json"), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_missing_messages_is_422() {
    let (status, body) = send(Some("application/json"), r#"{"model": "m"}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap_or_default()
            .contains("messages")
    );
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let (status, body) = send(None, r#"{"model": "m", "messages": []}"#).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_lenient_message_forms_are_accepted() {
    for body in [
        r#"{"messages": []}"#,
        r#"{"model": "m", "messages": [{"role": "tool", "content": "x"}]}"#,
        r#"{"model": "m", "messages": [{"role": "assistant", "content": null}]}"#,
        r#"{"model": "m", "messages": [{"role": "user", "content": [{"type": "text", "text": "a"}]}]}"#,
    ] {
        let (status, response) = send(Some("application/json"), body).await;
        assert!(
            !matches!(
                status,
                StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            ),
            "{} should be accepted, got {} {}",
            body,
            status,
            response
        );
    }
}
