//! Storage keys for telemetry documents.

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::config::TelemetryConfig;

/// Fixed document id of an endpoint's monthly summary.
pub const SUMMARY_DOC_ID: &str = "0_summary";

/// Replace the characters that would split or escape a storage path
/// segment (`/ ? # :`) with `_`.
pub fn sanitize_endpoint(endpoint: &str) -> String {
    endpoint
        .chars()
        .map(|c| match c {
            '/' | '?' | '#' | ':' => '_',
            c => c,
        })
        .collect()
}

/// `YYYY_MM` bucket for `at`.
pub fn year_month(at: DateTime<Utc>) -> String {
    at.format("%Y_%m").to_string()
}

/// RFC 3339 timestamp with millisecond precision.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Document id of a request or error log entry: its timestamp plus a short
/// random suffix, so entries written in the same millisecond never share a
/// path.
pub fn log_document_id(timestamp: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", timestamp, &suffix[..8])
}

/// Which set of collections a request's telemetry goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Live,
}

impl Environment {
    /// Dev when `host` contains the configured marker.
    pub fn classify(host: &str, marker: &str) -> Self {
        if !marker.is_empty() && host.contains(marker) {
            Environment::Dev
        } else {
            Environment::Live
        }
    }

    pub fn log_collection(self, config: &TelemetryConfig) -> &str {
        match self {
            Environment::Dev => &config.dev_collection,
            Environment::Live => &config.live_collection,
        }
    }

    pub fn error_collection(self, config: &TelemetryConfig) -> &str {
        match self {
            Environment::Dev => &config.dev_error_collection,
            Environment::Live => &config.live_error_collection,
        }
    }
}
