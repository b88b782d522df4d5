//! Client for the upstream content API.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// No response: connect failure, timeout, unreadable body.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),
    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Status { status: u16, body: String },
}

/// The content API the proxy routes forward to.
#[async_trait]
pub trait ContentApi: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, UpstreamError>;
    async fn post(&self, url: &str, body: Value) -> Result<Value, UpstreamError>;
}

pub struct HttpContentApi {
    client: reqwest::Client,
}

impl HttpContentApi {
    pub fn new(timeout: Duration) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response) -> Result<Value, UpstreamError> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        // Non-JSON bodies are passed through as a JSON string.
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

#[async_trait]
impl ContentApi for HttpContentApi {
    async fn get(&self, url: &str) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        Self::read(response).await
    }

    async fn post(&self, url: &str, body: Value) -> Result<Value, UpstreamError> {
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(e.to_string()))?;
        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_host() {
        let api = HttpContentApi::new(Duration::from_secs(2)).unwrap();
        let err = api.get("http://127.0.0.1:9/nothing").await.unwrap_err();
        assert!(matches!(err, UpstreamError::Unreachable(_)));
    }
}
