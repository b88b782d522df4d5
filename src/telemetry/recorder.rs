//! Telemetry recorder and its background writer.
//!
//! The request path never awaits the store. It builds the log document,
//! pushes it onto a bounded queue and returns; [`TelemetryWriter`] drains the
//! queue and performs the writes. Store failures end at the writer, logged.
//!
//! ```text
//! request_logger / error_reporter
//!     → TelemetryRecorder::record_* (counters, entry, try_send)
//!     → mpsc queue
//!     → TelemetryWriter (store.write, log failures)
//!
//! SummaryFlusher (every interval)
//!     → TelemetryRecorder::flush_summaries (merge writes, awaited)
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::config::TelemetryConfig;
use crate::observability::metrics;
use crate::security::geo::GeoResolver;
use crate::store::{Document, DocumentPath, TelemetryStore, WriteOptions};
use crate::telemetry::counter::EndpointCounters;
use crate::telemetry::entry::{
    format_load_time, to_document, EndpointSummary, ErrorLogEntry, RequestContext, RequestLogEntry,
};
use crate::telemetry::keys::{
    log_document_id, sanitize_endpoint, timestamp, year_month, Environment, SUMMARY_DOC_ID,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    Request,
    Error,
    Summary,
}

impl WriteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteKind::Request => "request",
            WriteKind::Error => "error",
            WriteKind::Summary => "summary",
        }
    }
}

/// A document waiting to be written.
#[derive(Debug, Clone)]
pub struct TelemetryWrite {
    pub kind: WriteKind,
    pub path: DocumentPath,
    pub document: Document,
    pub options: WriteOptions,
}

/// Result of one summary flush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
}

pub struct TelemetryRecorder {
    config: TelemetryConfig,
    geo: GeoResolver,
    counters: EndpointCounters,
    store: Arc<dyn TelemetryStore>,
    queue: mpsc::Sender<TelemetryWrite>,
}

impl TelemetryRecorder {
    /// Build a recorder and the writer that must be spawned to drain it.
    pub fn new(
        config: TelemetryConfig,
        geo: GeoResolver,
        store: Arc<dyn TelemetryStore>,
    ) -> (Self, TelemetryWriter) {
        let (queue, rx) = mpsc::channel(config.queue_capacity.max(1));
        let writer = TelemetryWriter {
            store: store.clone(),
            rx,
        };
        let recorder = Self {
            config,
            geo,
            counters: EndpointCounters::new(),
            store,
            queue,
        };
        (recorder, writer)
    }

    pub fn counters(&self) -> &EndpointCounters {
        &self.counters
    }

    pub fn environment(&self, host: &str) -> Environment {
        Environment::classify(host, &self.config.dev_marker)
    }

    /// Count the request and queue its log entry.
    pub fn record_request(&self, ctx: &RequestContext, status: u16, elapsed: Duration) {
        let collection = self.environment(&ctx.host).log_collection(&self.config);
        self.counters.increment(&ctx.url, collection);

        let now = Utc::now();
        let ts = timestamp(now);
        let geo = self.geo.locate(&ctx.identity);
        let entry = RequestLogEntry {
            method: ctx.method.clone(),
            url: ctx.url.clone(),
            status,
            load_time: format_load_time(elapsed),
            timestamp: ts.clone(),
            ip: ctx.identity.to_string(),
            country: geo.country,
            region: geo.region,
        };

        let path = DocumentPath::new([
            collection.to_string(),
            year_month(now),
            sanitize_endpoint(&ctx.url),
            log_document_id(&ts),
        ]);
        self.enqueue(WriteKind::Request, path, &entry, WriteOptions::OVERWRITE);
    }

    /// Queue an error log entry for a request that failed unexpectedly.
    pub fn record_error(&self, ctx: &RequestContext, message: &str, status: u16) {
        let collection = self.environment(&ctx.host).error_collection(&self.config);
        let ts = timestamp(Utc::now());
        let geo = self.geo.locate(&ctx.identity);
        let entry = ErrorLogEntry {
            error: message.to_string(),
            method: ctx.method.clone(),
            url: ctx.url.clone(),
            status,
            ip: ctx.identity.to_string(),
            country: geo.country,
            region: geo.region,
            timestamp: ts.clone(),
        };

        let path = DocumentPath::new([collection.to_string(), log_document_id(&ts)]);
        self.enqueue(WriteKind::Error, path, &entry, WriteOptions::OVERWRITE);
    }

    /// Merge the current cumulative count of every endpoint into its monthly
    /// summary document. Failed writes are logged and skipped.
    pub async fn flush_summaries(&self) -> FlushReport {
        let now = Utc::now();
        let ym = year_month(now);
        let ts = timestamp(now);
        let mut report = FlushReport::default();

        for count in self.counters.snapshot() {
            let path = DocumentPath::new([
                count.collection.clone(),
                ym.clone(),
                sanitize_endpoint(&count.endpoint),
                SUMMARY_DOC_ID.to_string(),
            ]);
            let summary = EndpointSummary {
                endpoint: count.endpoint,
                requests: count.requests,
                timestamp: ts.clone(),
            };

            let result = match to_document(&summary) {
                Ok(document) => self.store.write(&path, document, WriteOptions::MERGE).await,
                Err(e) => Err(e.into()),
            };
            match result {
                Ok(()) => {
                    debug!(path = %path, requests = summary.requests, "Endpoint summary saved");
                    metrics::record_telemetry_write(WriteKind::Summary.as_str(), true);
                    report.written += 1;
                }
                Err(e) => {
                    error!(path = %path, error = %e, "Failed to save endpoint summary");
                    metrics::record_telemetry_write(WriteKind::Summary.as_str(), false);
                    report.failed += 1;
                }
            }
        }

        info!(written = report.written, failed = report.failed, "Summary flush complete");
        report
    }

    fn enqueue<T: Serialize>(&self, kind: WriteKind, path: DocumentPath, value: &T, options: WriteOptions) {
        let document = match to_document(value) {
            Ok(document) => document,
            Err(e) => {
                error!(kind = kind.as_str(), path = %path, error = %e, "Failed to encode telemetry document");
                return;
            }
        };

        let write = TelemetryWrite {
            kind,
            path,
            document,
            options,
        };
        match self.queue.try_send(write) {
            Ok(()) => {}
            Err(TrySendError::Full(write)) => {
                warn!(kind = kind.as_str(), path = %write.path, "Telemetry queue full, dropping write");
                metrics::record_telemetry_dropped(kind.as_str());
            }
            Err(TrySendError::Closed(write)) => {
                debug!(kind = kind.as_str(), path = %write.path, "Telemetry writer stopped, dropping write");
                metrics::record_telemetry_dropped(kind.as_str());
            }
        }
    }
}

/// Drains queued writes into the store.
pub struct TelemetryWriter {
    store: Arc<dyn TelemetryStore>,
    rx: mpsc::Receiver<TelemetryWrite>,
}

impl TelemetryWriter {
    /// Write until every recorder handle has been dropped and the queue is
    /// empty.
    pub async fn run(mut self) {
        while let Some(write) = self.rx.recv().await {
            self.apply(write).await;
        }
        debug!("Telemetry writer finished");
    }

    /// Write whatever is queued right now. Returns the number of writes
    /// attempted.
    pub async fn drain(&mut self) -> usize {
        let mut attempted = 0;
        while let Ok(write) = self.rx.try_recv() {
            self.apply(write).await;
            attempted += 1;
        }
        attempted
    }

    async fn apply(&self, write: TelemetryWrite) {
        let TelemetryWrite {
            kind,
            path,
            document,
            options,
        } = write;

        match self.store.write(&path, document, options).await {
            Ok(()) => {
                debug!(kind = kind.as_str(), path = %path, "Telemetry saved");
                metrics::record_telemetry_write(kind.as_str(), true);
            }
            Err(e) => {
                error!(kind = kind.as_str(), path = %path, error = %e, "Failed to save telemetry");
                metrics::record_telemetry_write(kind.as_str(), false);
            }
        }
    }
}
