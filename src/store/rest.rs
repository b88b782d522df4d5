//! HTTP document store client.
//!
//! Speaks a minimal key-path protocol:
//! - `GET   {base}/{path}` → 200 with a JSON object, or 404 when absent
//! - `PUT   {base}/{path}` → replace the document
//! - `PATCH {base}/{path}` → merge fields into the document

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::{BlockStore, Document, DocumentPath, StoreError, TelemetryStore, WriteOptions};

pub struct RestDocumentStore {
    client: reqwest::Client,
    base_url: String,
}

impl RestDocumentStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

fn unavailable(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl BlockStore for RestDocumentStore {
    async fn get(&self, key: &DocumentPath) -> Result<Option<Document>, StoreError> {
        let response = self
            .client
            .get(self.url_for(key))
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let bytes = response.bytes().await.map_err(unavailable)?;
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            status => Err(StoreError::Rejected {
                path: key.to_string(),
                reason: format!("GET returned {}", status),
            }),
        }
    }
}

#[async_trait]
impl TelemetryStore for RestDocumentStore {
    async fn write(
        &self,
        path: &DocumentPath,
        document: Document,
        options: WriteOptions,
    ) -> Result<(), StoreError> {
        let url = self.url_for(path);
        let request = if options.merge {
            self.client.patch(url)
        } else {
            self.client.put(url)
        };

        let response = request.json(&document).send().await.map_err(unavailable)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Rejected {
                path: path.to_string(),
                reason: format!("write returned {}", status),
            })
        }
    }
}
