//! Upstream content API and the routes forwarding to it.
//!
//! # Data Flow
//! ```text
//! Admitted request
//!     → routes.rs (pick dev or live site from the request URL)
//!     → client.rs (reqwest, JSON in and out)
//!     → JSON response, relayed upstream error, or AppError (500)
//! ```

pub mod client;
pub mod routes;

pub use client::{ContentApi, HttpContentApi, UpstreamError};
pub use routes::{router, ProxyState};
