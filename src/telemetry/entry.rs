//! Telemetry records and the request facts they are built from.

use std::time::Duration;

use axum::body::Body;
use axum::http::{header::HOST, HeaderMap, Request, Uri};
use serde::Serialize;

use crate::security::identity::ClientIdentity;
use crate::store::Document;

/// What the telemetry layers capture from a request on entry.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: String,
    /// Path and query as received.
    pub url: String,
    /// Hostname without port.
    pub host: String,
    pub identity: ClientIdentity,
}

impl RequestContext {
    pub fn from_request(request: &Request<Body>) -> Self {
        Self {
            method: request.method().to_string(),
            url: request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string()),
            host: request_host(request.headers(), request.uri()),
            identity: ClientIdentity::from_request(request),
        }
    }
}

/// Hostname of a request from the `Host` header (or absolute URI), port removed.
pub fn request_host(headers: &HeaderMap, uri: &Uri) -> String {
    let raw = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();

    let host = if let Some(rest) = raw.strip_prefix('[') {
        // Bracketed IPv6 literal.
        rest.split(']').next().unwrap_or_default()
    } else {
        raw.split(':').next().unwrap_or_default()
    };
    host.to_ascii_lowercase()
}

/// One completed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLogEntry {
    pub method: String,
    pub url: String,
    pub status: u16,
    /// Milliseconds with three decimals, suffixed `ms`.
    pub load_time: String,
    pub timestamp: String,
    pub ip: String,
    pub country: String,
    pub region: String,
}

/// One request that ended in an unhandled error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorLogEntry {
    pub error: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub ip: String,
    pub country: String,
    pub region: String,
    pub timestamp: String,
}

/// Monthly per-endpoint summary, merged into the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointSummary {
    pub endpoint: String,
    pub requests: u64,
    pub timestamp: String,
}

pub fn format_load_time(elapsed: Duration) -> String {
    format!("{:.3}ms", elapsed.as_secs_f64() * 1_000.0)
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}
