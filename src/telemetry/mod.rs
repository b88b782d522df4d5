//! Telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! Request completes:
//!     → middleware.rs (capture context, time the request)
//!     → recorder.rs (count endpoint, build entry, enqueue)
//!     → writer task (store write, failures logged)
//!
//! Every summary interval:
//!     → summary.rs → recorder.flush_summaries (merge into 0_summary)
//! ```
//!
//! # Design Decisions
//! - Fire and forget: a slow or failing store never delays a response
//! - Bounded queue: overload drops log entries, never memory
//! - Counters are cumulative; summaries are merged, not appended

pub mod counter;
pub mod entry;
pub mod keys;
pub mod middleware;
pub mod recorder;
pub mod summary;

pub use counter::{EndpointCount, EndpointCounters};
pub use entry::{ErrorLogEntry, EndpointSummary, RequestContext, RequestLogEntry};
pub use keys::Environment;
pub use middleware::{error_reporter_middleware, request_logger_middleware};
pub use recorder::{FlushReport, TelemetryRecorder, TelemetryWrite, TelemetryWriter, WriteKind};
pub use summary::SummaryFlusher;
