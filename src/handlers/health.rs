//! Health check endpoint
//!
//! Liveness only: the backend is never contacted.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Service name
    pub service: &'static str,
}

/// Health check handler
pub async fn handler() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            service: "kiroproxy",
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler_returns_ok() {
        let (status, Json(body)) = handler().await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.service, "kiroproxy");
    }

    #[test]
    fn test_health_response_serializes() {
        let json = serde_json::to_value(HealthResponse {
            status: "ok",
            service: "kiroproxy",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "ok", "service": "kiroproxy"}));
    }
}
