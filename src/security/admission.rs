//! Admission gate.
//!
//! Composes the rate limiter and the blocklists into one decision per
//! request. The order is fixed: rate limit first, so a blocked client still
//! spends a slot in its window, then the IP list, then the country list.
//!
//! The two halves run as separate middleware so the request logger can sit
//! between them: rate-limited requests never reach telemetry, blocklist
//! denials do.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::observability::metrics;
use crate::security::blocklist::BlockRegistry;
use crate::security::geo::GeoResolver;
use crate::security::identity::ClientIdentity;
use crate::security::rate_limit::RateLimiter;

pub const RATE_LIMITED_BODY: &str = "Too many requests. Please try again later.";
pub const FORBIDDEN_BODY: &str = "Access forbidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    RateLimited,
    IpBlocked,
    CountryBlocked,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::RateLimited => "rate_limited",
            DenyReason::IpBlocked => "ip_blocked",
            DenyReason::CountryBlocked => "country_blocked",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DenyReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            DenyReason::IpBlocked | DenyReason::CountryBlocked => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for DenyReason {
    fn into_response(self) -> Response {
        let body = match self {
            DenyReason::RateLimited => RATE_LIMITED_BODY,
            DenyReason::IpBlocked | DenyReason::CountryBlocked => FORBIDDEN_BODY,
        };
        (self.status(), body).into_response()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny(DenyReason),
}

pub struct AdmissionGate {
    limiter: Option<Arc<RateLimiter>>,
    registry: Option<Arc<BlockRegistry>>,
    geo: GeoResolver,
}

impl AdmissionGate {
    pub fn new(limiter: Arc<RateLimiter>, registry: Arc<BlockRegistry>, geo: GeoResolver) -> Self {
        Self {
            limiter: Some(limiter),
            registry: Some(registry),
            geo,
        }
    }

    /// Skip rate limiting entirely.
    pub fn without_rate_limit(mut self) -> Self {
        self.limiter = None;
        self
    }

    /// Skip the IP and country lists entirely.
    pub fn without_blocklist(mut self) -> Self {
        self.registry = None;
        self
    }

    pub async fn evaluate(&self, identity: &ClientIdentity) -> Admission {
        if let Some(reason) = self.check_rate(identity) {
            return Admission::Deny(reason);
        }
        match self.check_blocklists(identity).await {
            Some(reason) => Admission::Deny(reason),
            None => Admission::Allow,
        }
    }

    /// Spend a slot in the client's window.
    pub fn check_rate(&self, identity: &ClientIdentity) -> Option<DenyReason> {
        let limiter = self.limiter.as_ref()?;
        (!limiter.admit(identity).allowed).then_some(DenyReason::RateLimited)
    }

    pub async fn check_blocklists(&self, identity: &ClientIdentity) -> Option<DenyReason> {
        let registry = self.registry.as_ref()?;

        let snapshot = registry.current_snapshot().await;
        if snapshot.is_ip_blocked(identity) {
            return Some(DenyReason::IpBlocked);
        }

        if !snapshot.blocked_countries.is_empty() {
            if let Some(country) = self.geo.country(identity) {
                if snapshot.is_country_blocked(&country) {
                    return Some(DenyReason::CountryBlocked);
                }
            }
        }

        None
    }

    pub fn rate_limit_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub fn blocklist_enabled(&self) -> bool {
        self.registry.is_some()
    }
}

/// Outer half of the gate: rejects over-capacity clients before any
/// telemetry runs.
pub async fn rate_limit_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = ClientIdentity::from_request(&request);
    match gate.check_rate(&identity) {
        Some(reason) => deny(&identity, reason, &request),
        None => next.run(request).await,
    }
}

/// Inner half of the gate: IP and country lists.
pub async fn blocklist_middleware(
    State(gate): State<Arc<AdmissionGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let identity = ClientIdentity::from_request(&request);
    match gate.check_blocklists(&identity).await {
        Some(reason) => deny(&identity, reason, &request),
        None => {
            metrics::record_admission("allow");
            next.run(request).await
        }
    }
}

fn deny(identity: &ClientIdentity, reason: DenyReason, request: &Request<Body>) -> Response {
    tracing::warn!(
        client = %identity,
        reason = reason.as_str(),
        path = %request.uri().path(),
        "Request denied"
    );
    metrics::record_admission(reason.as_str());
    reason.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BlocklistConfig;
    use crate::security::geo::StaticGeoLookup;
    use crate::store::{DocumentPath, MemoryStore};
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        store: Arc<MemoryStore>,
        limiter: Arc<RateLimiter>,
        gate: AdmissionGate,
    }

    fn fixture(capacity: u32) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        store.insert(
            &DocumentPath::new(["block", "IPs"]),
            json!({"a": "198.51.100.7"}).as_object().cloned().unwrap(),
        );
        store.insert(
            &DocumentPath::new(["block", "country"]),
            json!({"a": "KP"}).as_object().cloned().unwrap(),
        );
        let limiter = Arc::new(RateLimiter::new(Duration::from_secs(300), capacity));
        let registry = Arc::new(BlockRegistry::new(store.clone(), &BlocklistConfig::default()));
        let geo = GeoResolver::new(Arc::new(
            StaticGeoLookup::new()
                .with("203.0.113.5", "US", "CA")
                .with("192.0.2.50", "KP", "01"),
        ));
        let gate = AdmissionGate::new(limiter.clone(), registry, geo);
        Fixture { store, limiter, gate }
    }

    fn id(s: &str) -> ClientIdentity {
        ClientIdentity::normalize(s)
    }

    #[tokio::test]
    async fn test_unlisted_client_allowed() {
        let f = fixture(10);
        assert_eq!(f.gate.evaluate(&id("203.0.113.5")).await, Admission::Allow);
    }

    #[tokio::test]
    async fn test_blocked_ip_denied_and_counted() {
        let f = fixture(10);
        let client = id("::ffff:198.51.100.7");

        assert_eq!(f.gate.evaluate(&client).await, Admission::Deny(DenyReason::IpBlocked));
        assert_eq!(f.gate.evaluate(&client).await, Admission::Deny(DenyReason::IpBlocked));
        assert_eq!(f.limiter.window_for(&client).unwrap().count, 2);
    }

    #[tokio::test]
    async fn test_blocked_country_denied() {
        let f = fixture(10);
        assert_eq!(
            f.gate.evaluate(&id("192.0.2.50")).await,
            Admission::Deny(DenyReason::CountryBlocked)
        );
    }

    #[tokio::test]
    async fn test_rate_limit_checked_before_blocklist() {
        let f = fixture(1);
        let client = id("198.51.100.7");

        assert_eq!(f.gate.evaluate(&client).await, Admission::Deny(DenyReason::IpBlocked));
        assert_eq!(f.gate.evaluate(&client).await, Admission::Deny(DenyReason::RateLimited));
    }

    #[tokio::test]
    async fn test_halves_check_independently() {
        let f = fixture(1);
        let client = id("198.51.100.7");

        assert_eq!(f.gate.check_blocklists(&client).await, Some(DenyReason::IpBlocked));
        assert!(f.limiter.window_for(&client).is_none());

        assert_eq!(f.gate.check_rate(&client), None);
        assert_eq!(f.gate.check_rate(&client), Some(DenyReason::RateLimited));
    }

    #[tokio::test]
    async fn test_store_outage_fails_open() {
        let f = fixture(10);
        f.store.set_failing(true);

        assert_eq!(f.gate.evaluate(&id("198.51.100.7")).await, Admission::Allow);
        assert_eq!(f.gate.evaluate(&id("192.0.2.50")).await, Admission::Allow);
    }

    #[tokio::test]
    async fn test_disabled_checks() {
        let f = fixture(1);
        let gate = f.gate.without_rate_limit().without_blocklist();
        let client = id("198.51.100.7");

        assert_eq!(gate.evaluate(&client).await, Admission::Allow);
        assert_eq!(gate.evaluate(&client).await, Admission::Allow);
        assert!(f.limiter.window_for(&client).is_none());
    }

    #[test]
    fn test_deny_statuses() {
        assert_eq!(DenyReason::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(DenyReason::IpBlocked.status(), StatusCode::FORBIDDEN);
        assert_eq!(DenyReason::CountryBlocked.as_str(), "country_blocked");
    }
}
