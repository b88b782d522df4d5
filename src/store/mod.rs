//! Document store ports.
//!
//! The blocklist and telemetry both talk to a key-path document store. The
//! gateway only needs two narrow views of it: a point read for block
//! documents and a (merge-)write for log entries and summaries.
//!
//! # Path Layout
//! ```text
//! block/country                                   → { any: "CN", ... }
//! block/IPs                                       → { any: "198.51.100.7", ... }
//! live_logs/2026_10/_v1_api_player-stat_1_2/<ts>  → request log entry
//! live_logs/2026_10/_v1_api_player-stat_1_2/0_summary → merged summary
//! live_error_logs/<ts>                            → error log entry
//! ```

pub mod memory;
pub mod rest;

use std::fmt;

use async_trait::async_trait;

pub use memory::MemoryStore;
pub use rest::RestDocumentStore;

/// A stored document: a flat JSON object.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Hierarchical key of a document, one segment per level.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(Vec<String>);

impl DocumentPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected {path}: {reason}")]
    Rejected { path: String, reason: String },
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Write behaviour for [`TelemetryStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Merge fields into an existing document instead of replacing it.
    pub merge: bool,
}

impl WriteOptions {
    pub const OVERWRITE: Self = Self { merge: false };
    pub const MERGE: Self = Self { merge: true };
}

/// Read side used by the blocklist.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Fetch a document. `Ok(None)` means the document does not exist.
    async fn get(&self, key: &DocumentPath) -> Result<Option<Document>, StoreError>;
}

/// Write side used by telemetry.
#[async_trait]
pub trait TelemetryStore: Send + Sync {
    async fn write(
        &self,
        path: &DocumentPath,
        document: Document,
        options: WriteOptions,
    ) -> Result<(), StoreError>;
}
