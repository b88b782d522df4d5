//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_admission_total` (counter): admission decisions by `decision`
//!   (`allow`, `rate_limited`, `ip_blocked`, `country_blocked`)
//! - `gateway_blocklist_fetch_failures_total` (counter): store reads that
//!   degraded to an empty blocklist
//! - `gateway_telemetry_writes_total` (counter): store writes by `kind`, `outcome`
//! - `gateway_telemetry_dropped_total` (counter): writes dropped before the
//!   store, by `kind`
//! - `gateway_requests_total` (counter): completed requests by method, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//!
//! Every recorder is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(decision: &'static str) {
    ::metrics::counter!("gateway_admission_total", "decision" => decision).increment(1);
}

pub fn record_blocklist_fetch_failure() {
    ::metrics::counter!("gateway_blocklist_fetch_failures_total").increment(1);
}

pub fn record_telemetry_write(kind: &'static str, succeeded: bool) {
    let outcome = if succeeded { "ok" } else { "error" };
    ::metrics::counter!("gateway_telemetry_writes_total", "kind" => kind, "outcome" => outcome)
        .increment(1);
}

pub fn record_telemetry_dropped(kind: &'static str) {
    ::metrics::counter!("gateway_telemetry_dropped_total", "kind" => kind).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();
    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status
    )
    .record(start.elapsed().as_secs_f64());
}
