//! Command-line interface for kiroproxy

use clap::Parser;
use std::path::PathBuf;

/// OpenAI-compatible proxy for the Kiro assistant backend
#[derive(Parser, Debug)]
#[command(name = "kiroproxy")]
#[command(version)]
#[command(about = "OpenAI-compatible proxy for the Kiro assistant backend")]
#[command(
    long_about = "kiroproxy accepts OpenAI chat completion requests, tries the backend \
    for a request format it accepts, and answers in OpenAI format. \
    The client's api_key is used as the Kiro access token."
)]
pub struct Cli {
    /// Port to listen on (overrides the config file)
    pub port: Option<u16>,

    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (overrides the config file)
    #[arg(long)]
    pub host: Option<String>,
}

impl Cli {
    /// Apply CLI overrides on top of a loaded configuration
    pub fn apply_to(&self, config: &mut crate::config::Config) {
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
    }
}
