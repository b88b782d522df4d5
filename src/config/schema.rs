//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Per-client fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// IP and country blocklist documents.
    pub blocklist: BlocklistConfig,

    /// IP-to-geography database.
    pub geoip: GeoIpConfig,

    /// Request/error logging and endpoint summaries.
    pub telemetry: TelemetryConfig,

    /// Document store backing the blocklist and telemetry.
    pub store: StoreConfig,

    /// Upstream content API.
    pub upstream: UpstreamConfig,

    /// Static bearer token for write routes.
    pub auth: AuthConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:7000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:7000".to_string(),
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Length of one fixed window in seconds.
    pub window_secs: u64,

    /// Requests admitted per client per window.
    pub max_requests: u32,

    /// How often stale windows are swept, in seconds.
    pub eviction_interval_secs: u64,

    /// A window is stale once it is this many window lengths old.
    pub eviction_multiplier: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 5 * 60,
            max_requests: 1000,
            eviction_interval_secs: 60,
            eviction_multiplier: 2,
        }
    }
}

/// Where the blocked IP and country lists live in the document store.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlocklistConfig {
    /// Enable blocklist checks.
    pub enabled: bool,

    /// Collection holding both block documents.
    pub collection: String,

    /// Document whose values are blocked country codes.
    pub country_doc: String,

    /// Document whose values are blocked IPs.
    pub ip_doc: String,
}

impl Default for BlocklistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            collection: "block".to_string(),
            country_doc: "country".to_string(),
            ip_doc: "IPs".to_string(),
        }
    }
}

/// GeoIP database configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GeoIpConfig {
    /// Path to a MaxMind City (or Country) database. Lookups resolve to
    /// unknown when unset.
    pub city_db: Option<String>,
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Enable request/error logging.
    pub enabled: bool,

    /// Hostname substring that marks a request as dev traffic.
    pub dev_marker: String,

    pub dev_collection: String,
    pub live_collection: String,
    pub dev_error_collection: String,
    pub live_error_collection: String,

    /// Interval between endpoint summary flushes in seconds.
    pub summary_interval_secs: u64,

    /// Pending writes buffered before new ones are dropped.
    pub queue_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dev_marker: "dev.".to_string(),
            dev_collection: "dev_logs".to_string(),
            live_collection: "live_logs".to_string(),
            dev_error_collection: "dev_error_logs".to_string(),
            live_error_collection: "live_error_logs".to_string(),
            summary_interval_secs: 6 * 60 * 60,
            queue_capacity: 1024,
        }
    }
}

/// Document store backend.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Process-local store; contents are lost on restart.
    #[default]
    Memory,
    /// Remote key-path document store spoken to over HTTP.
    Rest,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub kind: StoreKind,

    /// Base URL of the REST document store.
    pub base_url: String,

    /// Per-call timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: StoreKind::Memory,
            base_url: String::new(),
            timeout_secs: 10,
        }
    }
}

/// Upstream content API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Site used for live traffic.
    pub live_base_url: String,

    /// Site used when the request URL contains `dev.`.
    pub dev_base_url: String,

    /// Leaderboard endpoint served for the `stats` request type.
    pub stats_url: String,

    /// Admin key appended to the leaderboard URL.
    pub stats_admin_key: String,

    /// Upstream request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            live_base_url: "https://sportspassports.com".to_string(),
            dev_base_url: "https://dev.sportspassports.com".to_string(),
            stats_url: "https://sportspassports.com/features/v1/stat-leaderboard/".to_string(),
            stats_admin_key: String::new(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Token expected as `Authorization: Bearer <token>` on write routes.
    /// An empty token rejects every write.
    pub bearer_token: String,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:7001".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [rate_limit]
            max_requests = 50

            [telemetry]
            dev_marker = "staging."
            "#,
        )
        .unwrap();

        assert_eq!(config.rate_limit.max_requests, 50);
        assert_eq!(config.rate_limit.window_secs, 300);
        assert_eq!(config.telemetry.dev_marker, "staging.");
        assert_eq!(config.telemetry.summary_interval_secs, 21_600);
        assert_eq!(config.blocklist.ip_doc, "IPs");
        assert_eq!(config.store.kind, StoreKind::Memory);
    }

    #[test]
    fn test_store_kind_lowercase() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [store]
            kind = "rest"
            base_url = "http://127.0.0.1:8500/v1/documents"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.kind, StoreKind::Rest);
        assert_eq!(config.store.timeout_secs, 10);
    }
}
