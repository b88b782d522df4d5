//! Static bearer-token check.

use axum::http::{header::AUTHORIZATION, HeaderMap};

const BEARER_PREFIX: &str = "Bearer ";

/// True when `headers` carry `Authorization: Bearer <expected>`. An empty
/// `expected` never matches.
pub fn verify_bearer(headers: &HeaderMap, expected: &str) -> bool {
    if expected.is_empty() {
        return false;
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .is_some_and(|token| token == expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_matching_token() {
        assert!(verify_bearer(&with_auth("Bearer s3cret"), "s3cret"));
    }

    #[test]
    fn test_rejections() {
        assert!(!verify_bearer(&with_auth("Bearer wrong"), "s3cret"));
        assert!(!verify_bearer(&with_auth("Basic s3cret"), "s3cret"));
        assert!(!verify_bearer(&HeaderMap::new(), "s3cret"));
        assert!(!verify_bearer(&with_auth("Bearer "), ""));
    }
}
