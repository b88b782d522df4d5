//! Telemetry middleware.
//!
//! `request_logger_middleware` records every completed request that got past
//! the rate limiter, blocklist denials included. `error_reporter_middleware` sits outside it and records an
//! error log for responses tagged with [`UnhandledError`].

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::error::UnhandledError;
use crate::observability::metrics;
use crate::telemetry::entry::RequestContext;
use crate::telemetry::recorder::TelemetryRecorder;

pub async fn request_logger_middleware(
    State(recorder): State<Arc<TelemetryRecorder>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::from_request(&request);

    let response = next.run(request).await;

    let status = response.status().as_u16();
    recorder.record_request(&ctx, status, start.elapsed());
    metrics::record_request(&ctx.method, status, start);
    tracing::debug!(
        method = %ctx.method,
        url = %ctx.url,
        status,
        client = %ctx.identity,
        "Request completed"
    );

    response
}

pub async fn error_reporter_middleware(
    State(recorder): State<Arc<TelemetryRecorder>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);

    let response = next.run(request).await;

    if let Some(unhandled) = response.extensions().get::<UnhandledError>() {
        tracing::error!(
            method = %ctx.method,
            url = %ctx.url,
            error = %unhandled.message,
            "Unhandled error"
        );
        recorder.record_error(&ctx, &unhandled.message, response.status().as_u16());
    }

    response
}
