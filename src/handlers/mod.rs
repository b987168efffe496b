//! HTTP request handlers for the kiroproxy API

use crate::config::Config;
use crate::error::AppResult;
use crate::metrics::Metrics;
use crate::middleware::{cors_middleware, request_id_middleware};
use crate::negotiate::{BackendTransport, Negotiator, ReqwestTransport};
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub mod anthropic;
pub mod health;
pub mod metrics;
pub mod openai;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    negotiator: Arc<Negotiator>,
    passthrough: Arc<dyn BackendTransport>,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState talking to the configured backend over HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or metrics registry cannot be
    /// created, or the negotiation axes are empty.
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let transport = ReqwestTransport::new(&config.backend)?;
        let passthrough = transport.clone().with_timeout(Duration::from_secs(
            config.backend.passthrough_timeout_seconds,
        ));
        Self::with_transports(config, Arc::new(transport), Arc::new(passthrough))
    }

    /// Create a new AppState whose negotiation and pass-through share one transport
    pub fn with_transport(
        config: Arc<Config>,
        transport: Arc<dyn BackendTransport>,
    ) -> AppResult<Self> {
        Self::with_transports(config, transport.clone(), transport)
    }

    /// Create a new AppState over arbitrary transports
    ///
    /// The two usually share one `reqwest::Client` and differ only in timeout.
    pub fn with_transports(
        config: Arc<Config>,
        transport: Arc<dyn BackendTransport>,
        passthrough: Arc<dyn BackendTransport>,
    ) -> AppResult<Self> {
        let metrics = Arc::new(Metrics::new()?);
        let negotiator = Arc::new(Negotiator::new(
            transport,
            &config.negotiation,
            metrics.clone(),
        )?);

        Ok(Self {
            config,
            negotiator,
            passthrough,
            metrics,
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the format negotiator
    pub fn negotiator(&self) -> &Negotiator {
        &self.negotiator
    }

    /// Get reference to the `/v1/messages` transport
    pub fn passthrough(&self) -> &dyn BackendTransport {
        self.passthrough.as_ref()
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Build the full application router
///
/// Layer order, outermost first: request tracing, request id, CORS. CORS
/// answers every `OPTIONS` before routing, and that response still gets an
/// `x-request-id`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/v1/chat/completions",
            post(openai::completions::handler).fallback(openai::extractor::method_not_allowed),
        )
        .route(
            "/v1/messages",
            post(anthropic::messages::handler).fallback(anthropic::messages::method_not_allowed),
        )
        .route(
            "/v1/models",
            get(openai::models::handler).fallback(openai::extractor::method_not_allowed),
        )
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(cors_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiate::NegotiationMode;

    fn create_test_config() -> Config {
        let mut config = Config::default();
        config.server.port = 3000;
        config.backend.url = "http://127.0.0.1:9/generateAssistantResponse".to_string();
        config
    }

    #[test]
    fn test_appstate_new_creates_state() {
        let state = AppState::new(Arc::new(create_test_config())).unwrap();

        assert_eq!(state.config().server.port, 3000);
        assert_eq!(state.negotiator().mode(), NegotiationMode::Sequential);
        assert_eq!(state.negotiator().attempt_space_size(4), 16);
        assert_eq!(state.passthrough().endpoint(), state.config().backend.url);
    }

    #[test]
    fn test_appstate_is_clonable() {
        let state = AppState::new(Arc::new(create_test_config())).unwrap();

        let state2 = state.clone();
        assert_eq!(state2.config().server.port, 3000);
        assert!(Arc::ptr_eq(state.metrics(), state2.metrics()));
    }

    #[test]
    fn test_appstate_rejects_empty_negotiation_axis() {
        let mut config = create_test_config();
        config.negotiation.content_types.clear();

        assert!(AppState::new(Arc::new(config)).is_err());
    }
}
