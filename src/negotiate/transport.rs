//! Outbound HTTP transport for negotiation attempts
//!
//! The negotiator only sees the [`BackendTransport`] trait, so tests can
//! inject a fake that never touches the network. [`ReqwestTransport`] is the
//! production implementation: one long-lived `reqwest::Client` whose
//! connection pool is shared by every request.

use crate::config::BackendConfig;
use crate::error::{AppError, AppResult};
use crate::negotiate::attempt::ContentType;
use async_trait::async_trait;
use axum::http::StatusCode;
use bytes::{Bytes, BytesMut};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use std::time::Duration;
use thiserror::Error;

/// Header naming the backend operation
pub const X_AMZ_TARGET: &str = "x-amz-target";
/// Header carrying the request timestamp
pub const X_AMZ_DATE: &str = "x-amz-date";

/// Largest backend response body read into memory
pub const MAX_BACKEND_RESPONSE_BYTES: usize = 16 * 1024 * 1024;

/// A fully prepared attempt, ready to put on the wire
#[derive(Clone)]
pub struct OutboundRequest {
    pub body: Vec<u8>,
    pub content_type: ContentType,
    /// Complete `Authorization` header value
    pub authorization: String,
}

impl std::fmt::Debug for OutboundRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutboundRequest")
            .field("body_len", &self.body.len())
            .field("content_type", &self.content_type)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// Status and raw body returned by the backend
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

/// Attempt failed before a complete response was received
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("backend request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("backend request failed: {0}")]
    Request(String),

    #[error("backend response exceeds {limit} bytes")]
    ResponseTooLarge { limit: usize },
}

/// Sends prepared attempts to the backend
#[async_trait]
pub trait BackendTransport: Send + Sync {
    /// Issue one POST and return whatever the backend answered
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError>;

    /// Backend URL, for logs
    fn endpoint(&self) -> &str;
}

/// [`BackendTransport`] over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    url: String,
    user_agent: String,
    service_target: String,
    timeout: Duration,
    max_response_bytes: usize,
}

impl ReqwestTransport {
    /// Build the transport and its HTTP client from backend configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed (TLS backend
    /// initialization failure).
    pub fn new(backend: &BackendConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            tracing::error!(error = %e, "Failed to create HTTP client for backend");
            AppError::Internal(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self::with_client(client, backend))
    }

    /// Wrap an existing client
    pub fn with_client(client: reqwest::Client, backend: &BackendConfig) -> Self {
        Self {
            client,
            url: backend.url.clone(),
            user_agent: backend.user_agent.clone(),
            service_target: backend.service_target.clone(),
            timeout: Duration::from_secs(backend.attempt_timeout_seconds),
            max_response_bytes: MAX_BACKEND_RESPONSE_BYTES,
        }
    }

    /// Same client and endpoint with a different per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Same client and endpoint with a different response size cap
    pub fn with_max_response_bytes(mut self, limit: usize) -> Self {
        self.max_response_bytes = limit;
        self
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl BackendTransport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<BackendResponse, TransportError> {
        let result = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, request.content_type.mime())
            .header(AUTHORIZATION, request.authorization)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .header(X_AMZ_TARGET, &self.service_target)
            .header(X_AMZ_DATE, amz_date())
            .timeout(self.timeout)
            .body(request.body)
            .send()
            .await;

        let response = result.map_err(|e| self.classify(e))?;
        let status = response.status();
        let body = self.read_body(response).await?;

        Ok(BackendResponse { status, body })
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

impl ReqwestTransport {
    async fn read_body(&self, mut response: reqwest::Response) -> Result<Bytes, TransportError> {
        let limit = self.max_response_bytes;
        let too_large = TransportError::ResponseTooLarge { limit };

        if response
            .content_length()
            .is_some_and(|len| len > limit as u64)
        {
            return Err(too_large);
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > limit {
                return Err(too_large);
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }

    fn classify(&self, error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else {
            TransportError::Request(error.to_string())
        }
    }
}

/// Current UTC time in the `X-Amz-Date` basic format (`20250101T120000Z`)
pub fn amz_date() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}
