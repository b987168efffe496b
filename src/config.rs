//! Configuration management for kiroproxy
//!
//! Every section has defaults, so the proxy runs with no config file at all.
//! Resolution order: built-in defaults, optional TOML file, environment
//! (`KIRO_BASE_URL`, `KIRO_ACCESS_TOKEN`, or their `ANTHROPIC_*` aliases),
//! CLI overrides, then `validate()`.

use crate::error::{AppError, AppResult};
use crate::negotiate::{ContentType, CredentialKind, NegotiationMode};
use crate::translate::CandidateShape;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding `backend.url`
pub const ENV_BASE_URL: &str = "KIRO_BASE_URL";
/// Environment variable overriding `backend.access_token`
pub const ENV_ACCESS_TOKEN: &str = "KIRO_ACCESS_TOKEN";
/// Alias of [`ENV_BASE_URL`], read when it is unset
pub const ENV_BASE_URL_ALIAS: &str = "ANTHROPIC_BASE_URL";
/// Alias of [`ENV_ACCESS_TOKEN`], read when it is unset
pub const ENV_ACCESS_TOKEN_ALIAS: &str = "ANTHROPIC_API_KEY";

/// Default backend endpoint
pub const DEFAULT_BACKEND_URL: &str =
    "https://codewhisperer.us-east-1.amazonaws.com/generateAssistantResponse";
/// Default `X-Amz-Target` value
pub const DEFAULT_SERVICE_TARGET: &str = "CodeWhispererService.GenerateAssistantResponse";

const MAX_TIMEOUT_SECONDS: u64 = 300;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub negotiation: NegotiationConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Backend endpoint configuration
#[derive(Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    /// Default credential, used when a request has no Authorization header
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_service_target")]
    pub service_target: String,
    /// Per-attempt timeout, in (0, 300]
    #[serde(default = "default_attempt_timeout")]
    pub attempt_timeout_seconds: u64,
    /// Timeout for `/v1/messages` pass-through requests, in (0, 300]
    #[serde(default = "default_passthrough_timeout")]
    pub passthrough_timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            access_token: None,
            user_agent: default_user_agent(),
            service_target: default_service_target(),
            attempt_timeout_seconds: default_attempt_timeout(),
            passthrough_timeout_seconds: default_passthrough_timeout(),
        }
    }
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user_agent", &self.user_agent)
            .field("service_target", &self.service_target)
            .field("attempt_timeout_seconds", &self.attempt_timeout_seconds)
            .field(
                "passthrough_timeout_seconds",
                &self.passthrough_timeout_seconds,
            )
            .finish()
    }
}

fn default_backend_url() -> String {
    DEFAULT_BACKEND_URL.to_string()
}

fn default_user_agent() -> String {
    concat!("kiroproxy/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_service_target() -> String {
    DEFAULT_SERVICE_TARGET.to_string()
}

fn default_attempt_timeout() -> u64 {
    10
}

fn default_passthrough_timeout() -> u64 {
    30
}

/// Attempt space and search mode
///
/// Restricting any axis to the single value known to work pins the search.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NegotiationConfig {
    #[serde(default = "default_shapes")]
    pub shapes: Vec<CandidateShape>,
    #[serde(default = "default_credentials")]
    pub credentials: Vec<CredentialKind>,
    #[serde(default = "default_content_types")]
    pub content_types: Vec<ContentType>,
    #[serde(default)]
    pub mode: NegotiationMode,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            shapes: default_shapes(),
            credentials: default_credentials(),
            content_types: default_content_types(),
            mode: NegotiationMode::default(),
        }
    }
}

fn default_shapes() -> Vec<CandidateShape> {
    CandidateShape::ALL.to_vec()
}

fn default_credentials() -> Vec<CredentialKind> {
    CredentialKind::ALL.to_vec()
}

fn default_content_types() -> Vec<ContentType> {
    ContentType::ALL.to_vec()
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path = path.as_ref();

        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
                path: path.to_path_buf(),
                source,
            })?;

        let config: Self =
            toml::from_str(&content).map_err(|source| AppError::ConfigParseFailed {
                path: path.to_path_buf(),
                source,
            })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Apply environment overrides from the process environment
    ///
    /// Returns the names of the variables that were applied. Runs before
    /// logging is initialized, so callers log the result themselves.
    pub fn apply_env(&mut self) -> Vec<&'static str> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides through `lookup`
    ///
    /// Empty values are ignored. For each setting the `KIRO_*` variable wins
    /// over its `ANTHROPIC_*` alias.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first_non_empty = |keys: [&'static str; 2]| {
            keys.into_iter().find_map(|key| {
                lookup(key)
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| (key, v))
            })
        };

        let mut applied = Vec::new();
        if let Some((key, url)) = first_non_empty([ENV_BASE_URL, ENV_BASE_URL_ALIAS]) {
            self.backend.url = url;
            applied.push(key);
        }
        if let Some((key, token)) = first_non_empty([ENV_ACCESS_TOKEN, ENV_ACCESS_TOKEN_ALIAS]) {
            self.backend.access_token = Some(token);
            applied.push(key);
        }
        applied
    }

    /// Default credential, if one is configured
    pub fn default_access_token(&self) -> Option<&str> {
        self.backend
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
    }

    /// Validate configuration
    ///
    /// Called by `from_file()`; call it explicitly after applying environment
    /// and CLI overrides.
    pub fn validate(&self) -> AppResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(AppError::Config("server.host must not be empty".to_string()));
        }

        let url = &self.backend.url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "backend.url must start with http:// or https://, got '{}'",
                url
            )));
        }

        validate_timeout(
            "backend.attempt_timeout_seconds",
            self.backend.attempt_timeout_seconds,
        )?;
        validate_timeout(
            "backend.passthrough_timeout_seconds",
            self.backend.passthrough_timeout_seconds,
        )?;

        if self.backend.user_agent.trim().is_empty() {
            return Err(AppError::Config(
                "backend.user_agent must not be empty".to_string(),
            ));
        }

        if let Some(token) = &self.backend.access_token
            && token.trim().is_empty()
        {
            return Err(AppError::Config(
                "backend.access_token must not be empty; omit it to require per-request tokens"
                    .to_string(),
            ));
        }

        validate_axis("negotiation.shapes", &self.negotiation.shapes)?;
        validate_axis("negotiation.credentials", &self.negotiation.credentials)?;
        validate_axis("negotiation.content_types", &self.negotiation.content_types)?;

        if !LOG_LEVELS.contains(&self.observability.log_level.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "observability.log_level must be one of {:?}, got '{}'",
                LOG_LEVELS, self.observability.log_level
            )));
        }

        Ok(())
    }
}

fn validate_timeout(name: &str, seconds: u64) -> AppResult<()> {
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(AppError::Config(format!(
            "{} must be in (0, {}], got {}",
            name, MAX_TIMEOUT_SECONDS, seconds
        )));
    }
    Ok(())
}

fn validate_axis<T: Eq + Hash + std::fmt::Debug>(name: &str, values: &[T]) -> AppResult<()> {
    if values.is_empty() {
        return Err(AppError::Config(format!("{} must not be empty", name)));
    }

    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(AppError::Config(format!(
                "{} lists {:?} more than once",
                name, value
            )));
        }
    }

    Ok(())
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".into(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
