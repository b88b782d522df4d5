//! Client identity resolution.
//!
//! The identity is the client's IP as a string, taken from the first
//! `X-Forwarded-For` hop when present, else the transport peer address.
//! IPv4-mapped IPv6 addresses are rewritten to bare IPv4 so that one client
//! never owns two keys.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Prefix of an IPv4 address embedded in IPv6 (`::ffff:a.b.c.d`).
pub const V4_MAPPED_PREFIX: &str = "::ffff:";

/// Used when neither a forwarded header nor a peer address is available.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientIdentity(String);

impl ClientIdentity {
    /// Normalize a raw address string into an identity.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let bare = match trimmed.get(..V4_MAPPED_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(V4_MAPPED_PREFIX) => {
                &trimmed[V4_MAPPED_PREFIX.len()..]
            }
            _ => trimmed,
        };

        if bare.is_empty() {
            Self(UNKNOWN_CLIENT.to_string())
        } else {
            Self(bare.to_string())
        }
    }

    /// Resolve from request headers, falling back to the peer address.
    pub fn resolve(headers: &HeaderMap, peer: Option<SocketAddr>) -> Self {
        let forwarded = headers
            .get(X_FORWARDED_FOR)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match (forwarded, peer) {
            (Some(hop), _) => Self::normalize(hop),
            (None, Some(addr)) => Self::normalize(&addr.ip().to_string()),
            (None, None) => Self(UNKNOWN_CLIENT.to_string()),
        }
    }

    /// Resolve for an axum request; the peer address comes from
    /// [`ConnectInfo`] when the server was started with it.
    pub fn from_request(request: &Request<Body>) -> Self {
        let peer = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Self::resolve(request.headers(), peer)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ip(&self) -> Option<IpAddr> {
        self.0.parse().ok()
    }
}

impl fmt::Display for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_v4_mapped_is_stripped() {
        assert_eq!(ClientIdentity::normalize("::ffff:203.0.113.5").as_str(), "203.0.113.5");
        assert_eq!(ClientIdentity::normalize("::FFFF:203.0.113.5").as_str(), "203.0.113.5");
    }

    #[test]
    fn test_plain_addresses_untouched() {
        assert_eq!(ClientIdentity::normalize("198.51.100.7").as_str(), "198.51.100.7");
        assert_eq!(ClientIdentity::normalize("2001:db8::1").as_str(), "2001:db8::1");
        assert_eq!(ClientIdentity::normalize("::1").as_str(), "::1");
    }

    #[test]
    fn test_forwarded_header_wins_over_peer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            X_FORWARDED_FOR,
            HeaderValue::from_static("::ffff:203.0.113.5, 10.0.0.1"),
        );
        let peer: SocketAddr = "10.0.0.1:5555".parse().unwrap();

        let id = ClientIdentity::resolve(&headers, Some(peer));
        assert_eq!(id.as_str(), "203.0.113.5");
        assert_eq!(id.ip(), Some("203.0.113.5".parse().unwrap()));
    }

    #[test]
    fn test_peer_v6_mapped_is_normalized() {
        let peer: SocketAddr = "[::ffff:192.0.2.10]:443".parse().unwrap();
        let id = ClientIdentity::resolve(&HeaderMap::new(), Some(peer));
        assert_eq!(id.as_str(), "192.0.2.10");
    }

    #[test]
    fn test_nothing_known() {
        let id = ClientIdentity::resolve(&HeaderMap::new(), None);
        assert_eq!(id.as_str(), UNKNOWN_CLIENT);
        assert_eq!(id.ip(), None);
    }
}
