//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variables that take precedence over the file.
pub const ENV_BEARER_TOKEN: &str = "GATEWAY_BEARER_TOKEN";
pub const ENV_STATS_ADMIN_KEY: &str = "GATEWAY_STATS_ADMIN_KEY";
pub const ENV_DEV_MARKER: &str = "GATEWAY_DEV_MARKER";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    finish(config)
}

/// Load from `path` when given, otherwise start from defaults. Environment
/// overrides and validation apply either way.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => finish(GatewayConfig::default()),
    }
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Replace secrets and the dev marker with values from `lookup` when present.
pub fn apply_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(token) = lookup(ENV_BEARER_TOKEN) {
        config.auth.bearer_token = token;
    }
    if let Some(key) = lookup(ENV_STATS_ADMIN_KEY) {
        config.upstream.stats_admin_key = key;
    }
    if let Some(marker) = lookup(ENV_DEV_MARKER).filter(|m| !m.is_empty()) {
        config.telemetry.dev_marker = marker;
    }
}
