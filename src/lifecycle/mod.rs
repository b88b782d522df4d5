//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → stores, GeoIP, upstream client → pipeline → listeners
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → broadcast → stop accepting → final summary flush
//!     → telemetry writer drains → exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)
//! - Shutdown has a timeout: the writer drain is abandoned after a deadline

pub mod shutdown;
pub mod startup;

pub use shutdown::{wait_for_signal, Shutdown};
pub use startup::{build_collaborators, StartupError};
