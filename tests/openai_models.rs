//! Integration tests for the informational endpoints
//!
//! `/v1/models`, `/health` and `/metrics` never contact the backend.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use kiroproxy::{
    config::Config,
    handlers::{AppState, build_router},
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceExt;

/// OpenAI model object response
#[derive(Debug, Deserialize)]
struct ModelObject {
    id: String,
    object: String,
    created: i64,
    owned_by: String,
}

/// OpenAI models list response
#[derive(Debug, Deserialize)]
struct ModelsListResponse {
    object: String,
    data: Vec<ModelObject>,
}

fn create_test_app() -> Router {
    let mut config = Config::default();
    config.backend.url = "http://127.0.0.1:9/generateAssistantResponse".to_string();
    let state = AppState::new(Arc::new(config)).expect("AppState::new should succeed");
    build_router(state)
}

async fn get(uri: &str) -> (StatusCode, bytes::Bytes) {
    let response = create_test_app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body)
}

#[tokio::test]
async fn test_models_endpoint_lists_static_models() {
    let (status, body) = get("/v1/models").await;
    assert_eq!(status, StatusCode::OK);

    let models: ModelsListResponse = serde_json::from_slice(&body).unwrap();
    assert_eq!(models.object, "list");

    let ids: Vec<&str> = models.data.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["claude-sonnet-4-20250514", "claude-3-7-sonnet-20250219"]
    );
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64;
    for model in &models.data {
        assert_eq!(model.object, "model");
        assert_eq!(model.owned_by, "kiro");
        assert!(
            (now - model.created).abs() <= 5,
            "created should be the current unix time, got {}",
            model.created
        );
    }
}

#[tokio::test]
async fn test_health_endpoint() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, serde_json::json!({"status": "ok", "service": "kiroproxy"}));
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_negotiation_metrics() {
    let (status, body) = get("/metrics").await;
    assert_eq!(status, StatusCode::OK);

    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("kiroproxy_negotiation_duration_seconds"));
    assert!(text.contains("kiroproxy_clock_errors_total"));
}
