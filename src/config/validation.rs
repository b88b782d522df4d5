//! Configuration validation.
//!
//! Serde handles syntax; this pass checks value ranges and addresses and
//! returns every problem it finds, not just the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::{GatewayConfig, StoreKind};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_socket_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);

    let rl = &config.rate_limit;
    if rl.window_secs == 0 {
        errors.push(ValidationError::new("rate_limit.window_secs", "must be greater than 0"));
    }
    if rl.max_requests == 0 {
        errors.push(ValidationError::new("rate_limit.max_requests", "must be greater than 0"));
    }
    if rl.eviction_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.eviction_interval_secs",
            "must be greater than 0",
        ));
    }
    // Evicting a window that has not yet expired would reset a client's count early.
    if rl.eviction_multiplier < 1 {
        errors.push(ValidationError::new("rate_limit.eviction_multiplier", "must be at least 1"));
    }

    let bl = &config.blocklist;
    for (field, value) in [
        ("blocklist.collection", &bl.collection),
        ("blocklist.country_doc", &bl.country_doc),
        ("blocklist.ip_doc", &bl.ip_doc),
    ] {
        if value.is_empty() {
            errors.push(ValidationError::new(field, "must not be empty"));
        }
    }

    let tel = &config.telemetry;
    if tel.summary_interval_secs == 0 {
        errors.push(ValidationError::new(
            "telemetry.summary_interval_secs",
            "must be greater than 0",
        ));
    }
    if tel.queue_capacity == 0 {
        errors.push(ValidationError::new("telemetry.queue_capacity", "must be greater than 0"));
    }
    for (field, value) in [
        ("telemetry.dev_collection", &tel.dev_collection),
        ("telemetry.live_collection", &tel.live_collection),
        ("telemetry.dev_error_collection", &tel.dev_error_collection),
        ("telemetry.live_error_collection", &tel.live_error_collection),
    ] {
        if value.is_empty() || value.contains('/') {
            errors.push(ValidationError::new(field, "must be a single non-empty path segment"));
        }
    }

    if config.store.kind == StoreKind::Rest {
        check_url(&mut errors, "store.base_url", &config.store.base_url);
    }

    check_url(&mut errors, "upstream.live_base_url", &config.upstream.live_base_url);
    check_url(&mut errors, "upstream.dev_base_url", &config.upstream.dev_base_url);
    check_url(&mut errors, "upstream.stats_url", &config.upstream.stats_url);

    if config.admin.enabled {
        check_socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() || config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
            errors.push(ValidationError::new("admin.api_key", "must be set when admin is enabled"));
        }
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(field, format!("invalid socket address {:?}", value)));
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if let Err(e) = Url::parse(value) {
        errors.push(ValidationError::new(field, format!("invalid URL {:?}: {}", value, e)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.eviction_multiplier = 0;
        config.telemetry.live_collection = "live/logs".into();
        config.store.kind = StoreKind::Rest;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "rate_limit.max_requests",
                "rate_limit.eviction_multiplier",
                "telemetry.live_collection",
                "store.base_url",
            ]
        );
    }

    #[test]
    fn test_admin_requires_real_key() {
        let mut config = GatewayConfig::default();
        config.admin.enabled = true;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "admin.api_key");
    }
}
