//! Request pipeline assembly.
//!
//! Layer order, outermost first:
//!
//! ```text
//! TraceLayer
//!   → SetRequestId / PropagateRequestId
//!   → Compression
//!   → rate_limit       (429 before any telemetry)
//!   → error_reporter   (error log for UnhandledError responses)
//!   → request_logger   (every response past the rate limit, 403s included)
//!   → CatchPanic       (panic → 500 Critical Error)
//!   → blocklist        (IP list → country list)
//!   → proxy routes
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::panic_response;
use crate::security::{
    blocklist_middleware, rate_limit_middleware, AdmissionGate, BlockRegistry, GeoLookup, GeoResolver,
    RateLimiter,
};
use crate::store::{BlockStore, TelemetryStore};
use crate::telemetry::{
    error_reporter_middleware, request_logger_middleware, TelemetryRecorder, TelemetryWriter,
};
use crate::upstream::{self, ContentApi, ProxyState};

/// External systems the pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub block_store: Arc<dyn BlockStore>,
    pub telemetry_store: Arc<dyn TelemetryStore>,
    pub geo: Arc<dyn GeoLookup>,
    pub content_api: Arc<dyn ContentApi>,
}

pub struct Pipeline {
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
    gate: Arc<AdmissionGate>,
    recorder: Arc<TelemetryRecorder>,
    proxy: ProxyState,
}

impl Pipeline {
    /// Wire every component. The returned writer must be spawned (or
    /// drained) for telemetry to reach the store.
    pub fn new(config: &GatewayConfig, collaborators: Collaborators) -> (Self, TelemetryWriter) {
        let geo = GeoResolver::new(collaborators.geo);

        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let registry = Arc::new(BlockRegistry::new(collaborators.block_store, &config.blocklist));

        let mut gate = AdmissionGate::new(limiter.clone(), registry, geo.clone());
        if !config.rate_limit.enabled {
            gate = gate.without_rate_limit();
        }
        if !config.blocklist.enabled {
            gate = gate.without_blocklist();
        }

        let (recorder, writer) =
            TelemetryRecorder::new(config.telemetry.clone(), geo, collaborators.telemetry_store);

        let proxy = ProxyState {
            api: collaborators.content_api,
            upstream: config.upstream.clone(),
            bearer_token: config.auth.bearer_token.clone(),
            dev_marker: config.telemetry.dev_marker.clone(),
        };

        let pipeline = Self {
            config: config.clone(),
            limiter,
            gate: Arc::new(gate),
            recorder: Arc::new(recorder),
            proxy,
        };
        (pipeline, writer)
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        self.limiter.clone()
    }

    pub fn recorder(&self) -> Arc<TelemetryRecorder> {
        self.recorder.clone()
    }

    /// Age after which a rate window is swept.
    pub fn eviction_age(&self) -> Duration {
        self.limiter.window() * self.config.rate_limit.eviction_multiplier
    }

    pub fn router(&self) -> Router {
        let mut app = upstream::router(self.proxy.clone());

        if self.gate.rate_limit_enabled() || self.gate.blocklist_enabled() {
            app = app.layer(middleware::from_fn_with_state(self.gate.clone(), blocklist_middleware));
        }
        app = app.layer(CatchPanicLayer::custom(panic_response));

        if self.config.telemetry.enabled {
            app = app
                .layer(middleware::from_fn_with_state(
                    self.recorder.clone(),
                    request_logger_middleware,
                ))
                .layer(middleware::from_fn_with_state(
                    self.recorder.clone(),
                    error_reporter_middleware,
                ));
        }

        if self.gate.rate_limit_enabled() {
            app = app.layer(middleware::from_fn_with_state(self.gate.clone(), rate_limit_middleware));
        }

        app.layer(CompressionLayer::new())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }
}
