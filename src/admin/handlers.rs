use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::admin::AdminState;
use crate::telemetry::{EndpointCount, FlushReport};

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub instance_id: Uuid,
    pub uptime_secs: u64,
    pub tracked_clients: usize,
    pub tracked_endpoints: usize,
}

#[derive(Serialize)]
pub struct EndpointReport {
    pub total_requests: u64,
    pub endpoints: Vec<EndpointCount>,
}

pub async fn get_status(State(state): State<Arc<AdminState>>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        instance_id: state.instance_id,
        uptime_secs: state.started.elapsed().as_secs(),
        tracked_clients: state.limiter.tracked_clients(),
        tracked_endpoints: state.recorder.counters().len(),
    })
}

pub async fn get_endpoints(State(state): State<Arc<AdminState>>) -> Json<EndpointReport> {
    let endpoints = state.recorder.counters().snapshot();
    Json(EndpointReport {
        total_requests: endpoints.iter().map(|e| e.requests).sum(),
        endpoints,
    })
}

/// Write every endpoint summary now instead of waiting for the next tick.
pub async fn post_flush(State(state): State<Arc<AdminState>>) -> Json<FlushReport> {
    tracing::info!("Manual summary flush requested");
    Json(state.recorder.flush_summaries().await)
}
