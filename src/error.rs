//! Application error type.
//!
//! Handlers return [`AppError`] for failures nobody anticipated. The client
//! always sees a plain 500 "Critical Error"; the detail travels on the
//! response as an [`UnhandledError`] extension, where the error reporter
//! picks it up and writes the error log.

use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::upstream::client::UpstreamError;

pub const CRITICAL_ERROR_BODY: &str = "Critical Error";

/// Response extension carrying the message of an unhandled error.
#[derive(Debug, Clone)]
pub struct UnhandledError {
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("upstream: {0}")]
    Upstream(#[from] UpstreamError),
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        critical_error_response(self.to_string())
    }
}

/// 500 "Critical Error" tagged with `message` for the error reporter.
pub fn critical_error_response(message: impl Into<String>) -> Response {
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, CRITICAL_ERROR_BODY).into_response();
    response.extensions_mut().insert(UnhandledError {
        message: message.into(),
    });
    response
}

/// Panic handler for `CatchPanicLayer::custom`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %message, "Handler panicked");
    critical_error_response(format!("panic: {}", message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_is_critical_500() {
        let response = AppError::Internal("db down".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<UnhandledError>().unwrap().message,
            "db down"
        );
    }

    #[test]
    fn test_malformed_body_is_critical_500() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response
            .extensions()
            .get::<UnhandledError>()
            .unwrap()
            .message
            .starts_with("invalid JSON body"));
    }

    #[test]
    fn test_panic_payload_is_captured() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.extensions().get::<UnhandledError>().unwrap().message,
            "panic: boom"
        );
    }
}
