//! Configuration file loading tests
//!
//! Exercises `Config::from_file` against real files, and the full resolution
//! order: file, then environment, then CLI, then validation.

use clap::Parser;
use kiroproxy::{
    cli::Cli,
    config::{Config, ENV_ACCESS_TOKEN_ALIAS, ENV_BASE_URL, ENV_BASE_URL_ALIAS},
    error::AppError,
    negotiate::NegotiationMode,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_from_file_loads_valid_config() {
    let file = write_config(
        r#"
[server]
port = 9000

[backend]
attempt_timeout_seconds = 20

[negotiation]
mode = "concurrent"
"#,
    );

    let config = Config::from_file(file.path()).expect("config should load");
    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.backend.attempt_timeout_seconds, 20);
    assert_eq!(config.negotiation.mode, NegotiationMode::Concurrent);
}

#[test]
fn test_missing_file_is_read_error_with_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = Config::from_file(&path).unwrap_err();
    assert!(matches!(err, AppError::ConfigFileRead { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_invalid_toml_is_parse_error() {
    let file = write_config("[server\nport = ");

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(matches!(err, AppError::ConfigParseFailed { .. }));
}

#[test]
fn test_out_of_range_value_is_validation_error() {
    let file = write_config("[backend]\nattempt_timeout_seconds = 0\n");

    let err = Config::from_file(file.path()).unwrap_err();
    match err {
        AppError::ConfigValidationFailed { reason, .. } => {
            assert!(reason.contains("attempt_timeout_seconds"), "got: {}", reason)
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_resolution_order_file_env_cli() {
    let file = write_config(
        r#"
[server]
host = "127.0.0.1"
port = 9000

[backend]
url = "http://file.example/api"
access_token = "file-token"
"#,
    );

    let cli = Cli::parse_from([
        "kiroproxy",
        "9100",
        "--config",
        file.path().to_str().unwrap(),
    ]);

    let mut config = Config::from_file(cli.config.as_ref().unwrap()).unwrap();
    config.apply_env_with(|key| {
        (key == ENV_BASE_URL).then(|| "https://env.example/api".to_string())
    });
    cli.apply_to(&mut config);
    config.validate().expect("resolved config should be valid");

    assert_eq!(config.server.port, 9100, "CLI wins over file");
    assert_eq!(config.server.host, "127.0.0.1", "file value kept");
    assert_eq!(config.backend.url, "https://env.example/api", "env wins over file");
    assert_eq!(config.default_access_token(), Some("file-token"));
}

#[test]
fn test_anthropic_env_names_configure_backend() {
    let file = write_config("[server]\nport = 9000\n");

    let mut config = Config::from_file(file.path()).unwrap();
    let applied = config.apply_env_with(|key| match key {
        ENV_BASE_URL_ALIAS => Some("https://anthropic-style.example/api".to_string()),
        ENV_ACCESS_TOKEN_ALIAS => Some("sk-from-env".to_string()),
        _ => None,
    });
    config.validate().expect("resolved config should be valid");

    assert_eq!(applied, vec![ENV_BASE_URL_ALIAS, ENV_ACCESS_TOKEN_ALIAS]);
    assert_eq!(config.backend.url, "https://anthropic-style.example/api");
    assert_eq!(config.default_access_token(), Some("sk-from-env"));
}

#[test]
fn test_passthrough_timeout_out_of_range_is_validation_error() {
    let file = write_config("[backend]\npassthrough_timeout_seconds = 301\n");

    let err = Config::from_file(file.path()).unwrap_err();
    assert!(
        err.to_string().contains("passthrough_timeout_seconds"),
        "got: {}",
        err
    );
}
