//! In-process document store.
//!
//! Backs both store ports for local runs and tests. Every write attempt is
//! journaled (including failed ones) and the store can be switched into a
//! failing mode to simulate a backend outage.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;

use super::{BlockStore, Document, DocumentPath, StoreError, TelemetryStore, WriteOptions};

/// One journaled write attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub path: String,
    pub merge: bool,
    pub succeeded: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    documents: DashMap<String, Document>,
    journal: Mutex<Vec<WriteRecord>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Seed a document directly, bypassing the journal.
    pub fn insert(&self, path: &DocumentPath, document: Document) {
        self.documents.insert(path.to_string(), document);
    }

    pub fn document(&self, path: &str) -> Option<Document> {
        self.documents.get(path).map(|d| d.value().clone())
    }

    /// Stored paths under `prefix`, sorted.
    pub fn paths_with_prefix(&self, prefix: &str) -> Vec<String> {
        let mut paths: Vec<String> = self
            .documents
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| e.key().clone())
            .collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Every write attempted so far, in order.
    pub fn writes(&self) -> Vec<WriteRecord> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn journal(&self, path: &DocumentPath, options: WriteOptions, succeeded: bool) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(WriteRecord {
                path: path.to_string(),
                merge: options.merge,
                succeeded,
            });
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store is in failing mode".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BlockStore for MemoryStore {
    async fn get(&self, key: &DocumentPath) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        Ok(self.document(&key.to_string()))
    }
}

#[async_trait]
impl TelemetryStore for MemoryStore {
    async fn write(
        &self,
        path: &DocumentPath,
        document: Document,
        options: WriteOptions,
    ) -> Result<(), StoreError> {
        if let Err(e) = self.check_available() {
            self.journal(path, options, false);
            return Err(e);
        }

        let key = path.to_string();
        if options.merge {
            self.documents.entry(key).or_default().extend(document);
        } else {
            self.documents.insert(key, document);
        }
        self.journal(path, options, true);
        Ok(())
    }
}
