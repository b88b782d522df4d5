//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → identity.rs (X-Forwarded-For or peer address, v4-mapped stripped)
//!     → admission.rs
//!         → rate_limit.rs (fixed window per client)
//!         → blocklist.rs (fresh IP / country lists from the store)
//!         → geo.rs (country of the client)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Rate limiting runs before the blocklists; denied clients still spend a slot
//! - Rate-limited requests are rejected ahead of telemetry, blocklist denials are logged
//! - Fail open: an unreachable blocklist store never rejects traffic
//! - Only genuinely unexpected errors become a 500

pub mod admission;
pub mod auth;
pub mod blocklist;
pub mod geo;
pub mod identity;
pub mod rate_limit;

pub use admission::{blocklist_middleware, rate_limit_middleware, Admission, AdmissionGate, DenyReason};
pub use blocklist::{BlockRegistry, BlockSnapshot};
pub use geo::{GeoLocation, GeoLookup, GeoResolver, MaxMindGeoLookup, StaticGeoLookup};
pub use identity::ClientIdentity;
pub use rate_limit::{RateDecision, RateLimiter, RateWindow};
