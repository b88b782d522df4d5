//! Stat gateway library.
//!
//! Request admission (fixed-window rate limiting, IP and country
//! blocklists), request/error telemetry with monthly endpoint summaries, and
//! the proxy routes in front of the content API.

pub mod admin;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod store;
pub mod telemetry;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use error::AppError;
pub use http::{Collaborators, GatewayServer, Pipeline};
pub use lifecycle::Shutdown;
