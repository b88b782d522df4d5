//! Shared utilities for integration tests.
//!
//! [`TestGateway`] wires the full pipeline against an in-memory store, a
//! static GeoIP table and a scripted content API, and sends requests through
//! the router with `tower::ServiceExt::oneshot`.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, Response};
use axum::Router;
use serde_json::{json, Value};
use stat_gateway::config::GatewayConfig;
use stat_gateway::http::{Collaborators, Pipeline};
use stat_gateway::security::StaticGeoLookup;
use stat_gateway::store::{Document, DocumentPath, MemoryStore};
use stat_gateway::telemetry::TelemetryWriter;
use stat_gateway::upstream::{ContentApi, UpstreamError};
use tower::ServiceExt;

pub const BEARER_TOKEN: &str = "test-token";

/// Content API double: echoes the requested URL, or fails as scripted.
#[derive(Default)]
pub struct FakeContentApi {
    calls: Mutex<Vec<(String, Option<Value>)>>,
    error_status: Mutex<Option<(u16, String)>>,
    unreachable: AtomicBool,
}

impl FakeContentApi {
    pub fn fail_with_status(&self, status: u16, body: &str) {
        *self.error_status.lock().unwrap() = Some((status, body.to_string()));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(String, Option<Value>)> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, url: &str, body: Option<Value>) -> Result<Value, UpstreamError> {
        self.calls.lock().unwrap().push((url.to_string(), body));
        if url.contains("/panic/") {
            panic!("content api exploded");
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(UpstreamError::Unreachable("connection refused".into()));
        }
        if let Some((status, body)) = self.error_status.lock().unwrap().clone() {
            return Err(UpstreamError::Status { status, body });
        }
        Ok(json!({ "url": url }))
    }
}

#[async_trait]
impl ContentApi for FakeContentApi {
    async fn get(&self, url: &str) -> Result<Value, UpstreamError> {
        self.answer(url, None)
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value, UpstreamError> {
        self.answer(url, Some(body))
    }
}

pub struct TestGateway {
    pub store: Arc<MemoryStore>,
    pub api: Arc<FakeContentApi>,
    pub pipeline: Pipeline,
    pub writer: TelemetryWriter,
    pub router: Router,
}

impl TestGateway {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let api = Arc::new(FakeContentApi::default());
        let geo = StaticGeoLookup::new()
            .with("203.0.113.5", "US", "CA")
            .with("192.0.2.50", "KP", "01")
            .with("198.51.100.20", "CN", "BJ");

        let collaborators = Collaborators {
            block_store: store.clone(),
            telemetry_store: store.clone(),
            geo: Arc::new(geo),
            content_api: api.clone(),
        };
        let (pipeline, writer) = Pipeline::new(&config, collaborators);
        let router = pipeline.router();

        Self {
            store,
            api,
            pipeline,
            writer,
            router,
        }
    }

    pub fn block_ips(&self, ips: &[&str]) {
        self.store.insert(&DocumentPath::new(["block", "IPs"]), values_doc(ips));
    }

    pub fn block_countries(&self, countries: &[&str]) {
        self.store.insert(&DocumentPath::new(["block", "country"]), values_doc(countries));
    }

    /// GET `uri` from `client` with the default host.
    pub async fn get(&self, uri: &str, client: &str) -> Response<Body> {
        self.send(request(Method::GET, uri, client, "stats.example.com").body(Body::empty()).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Write every queued telemetry document.
    pub async fn flush_queue(&mut self) -> usize {
        self.writer.drain().await
    }
}

/// Defaults with a known bearer token.
pub fn test_config() -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.bearer_token = BEARER_TOKEN.to_string();
    config
}

/// Request builder carrying the peer address the server would attach.
pub fn request(method: Method, uri: &str, client: &str, host: &str) -> axum::http::request::Builder {
    let peer: SocketAddr = format!("{}:40000", client)
        .parse()
        .unwrap_or_else(|_| format!("[{}]:40000", client).parse().unwrap());
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
        .extension(ConnectInfo(peer))
}

/// Output of a thread-local `tracing` subscriber, for asserting on local
/// diagnostics. Install with `tracing::subscriber::set_default`.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn values_doc(values: &[&str]) -> Document {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("entry{}", i), Value::String(v.to_string())))
        .collect()
}
