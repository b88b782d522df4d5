//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum::serve, peer address, graceful shutdown)
//!     → pipeline.rs (tracing, request ID, telemetry, admission layers)
//!     → upstream routes
//!     → Send to client
//! ```

pub mod pipeline;
pub mod server;

pub use pipeline::{Collaborators, Pipeline};
pub use server::GatewayServer;
