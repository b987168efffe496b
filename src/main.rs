//! kiroproxy HTTP server
//!
//! Starts an Axum web server exposing an OpenAI-compatible API in front of
//! the Kiro assistant backend.

use clap::Parser;
use kiroproxy::{
    cli::Cli,
    config::{Config, ENV_ACCESS_TOKEN, ENV_ACCESS_TOKEN_ALIAS},
    handlers::{self, AppState},
    telemetry,
};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let env_overrides = config.apply_env();
    cli.apply_to(&mut config);
    config.validate()?;

    telemetry::init(&config.observability.log_level);

    for variable in env_overrides {
        tracing::info!(variable, "Configuration overridden from environment");
    }

    if config.default_access_token().is_none() {
        tracing::warn!(
            "No default access token configured ({} or {}). \
            Requests without an Authorization header will be rejected.",
            ENV_ACCESS_TOKEN,
            ENV_ACCESS_TOKEN_ALIAS
        );
    }

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    tracing::info!(
        backend = %config.backend.url,
        mode = ?config.negotiation.mode,
        shapes = config.negotiation.shapes.len(),
        credentials = config.negotiation.credentials.len(),
        content_types = config.negotiation.content_types.len(),
        "Starting kiroproxy"
    );

    let state = AppState::new(Arc::new(config))?;
    let app = handlers::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("OpenAI API base URL: http://{}/v1", addr);
    tracing::info!("Messages pass-through at http://{}/v1/messages", addr);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
