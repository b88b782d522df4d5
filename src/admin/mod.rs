//! Admin API.
//!
//! Bearer-protected JSON endpoints on their own listener:
//! - `GET /admin/status`: version, uptime, tracked clients and endpoints
//! - `GET /admin/endpoints`: cumulative per-endpoint counters
//! - `POST /admin/flush`: write endpoint summaries immediately

pub mod auth;
pub mod handlers;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use uuid::Uuid;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::security::RateLimiter;
use crate::telemetry::TelemetryRecorder;

pub struct AdminState {
    pub recorder: Arc<TelemetryRecorder>,
    pub limiter: Arc<RateLimiter>,
    pub api_key: String,
    pub instance_id: Uuid,
    pub started: Instant,
}

impl AdminState {
    pub fn new(recorder: Arc<TelemetryRecorder>, limiter: Arc<RateLimiter>, api_key: String) -> Self {
        Self {
            recorder,
            limiter,
            api_key,
            instance_id: Uuid::new_v4(),
            started: Instant::now(),
        }
    }
}

pub fn setup_admin_router(state: AdminState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/endpoints", get(get_endpoints))
        .route("/admin/flush", post(post_flush))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
