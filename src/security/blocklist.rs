//! Blocked IP and country lists.
//!
//! Both lists live in the document store as two documents whose *values*
//! are the blocked entries. They are read fresh on every admission check.
//! A store failure yields an empty snapshot so that an outage never blocks
//! legitimate traffic.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::BlocklistConfig;
use crate::security::identity::ClientIdentity;
use crate::store::{BlockStore, Document, DocumentPath, StoreError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockSnapshot {
    pub blocked_ips: HashSet<String>,
    pub blocked_countries: HashSet<String>,
}

impl BlockSnapshot {
    pub fn is_ip_blocked(&self, identity: &ClientIdentity) -> bool {
        self.blocked_ips.contains(identity.as_str())
    }

    pub fn is_country_blocked(&self, country: &str) -> bool {
        self.blocked_countries.contains(country)
    }

    pub fn is_empty(&self) -> bool {
        self.blocked_ips.is_empty() && self.blocked_countries.is_empty()
    }
}

pub struct BlockRegistry {
    store: Arc<dyn BlockStore>,
    country_key: DocumentPath,
    ip_key: DocumentPath,
}

impl BlockRegistry {
    pub fn new(store: Arc<dyn BlockStore>, config: &BlocklistConfig) -> Self {
        Self {
            store,
            country_key: DocumentPath::new([config.collection.as_str(), config.country_doc.as_str()]),
            ip_key: DocumentPath::new([config.collection.as_str(), config.ip_doc.as_str()]),
        }
    }

    /// Fetch the current lists. Never fails: store errors degrade to an
    /// empty snapshot.
    pub async fn current_snapshot(&self) -> BlockSnapshot {
        match self.fetch().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!(error = %e, "Failed to fetch blocklists, admitting without them");
                crate::observability::metrics::record_blocklist_fetch_failure();
                BlockSnapshot::default()
            }
        }
    }

    async fn fetch(&self) -> Result<BlockSnapshot, StoreError> {
        let (countries, ips) = tokio::join!(
            self.store.get(&self.country_key),
            self.store.get(&self.ip_key)
        );

        let blocked_countries = match countries? {
            Some(doc) => values_of(&doc),
            None => {
                info!(key = %self.country_key, "No country blocklist document");
                HashSet::new()
            }
        };
        let blocked_ips = match ips? {
            Some(doc) => values_of(&doc),
            None => {
                info!(key = %self.ip_key, "No IP blocklist document");
                HashSet::new()
            }
        };

        Ok(BlockSnapshot {
            blocked_ips,
            blocked_countries,
        })
    }
}

/// The blocked entries are the document's string values; keys are labels.
fn values_of(doc: &Document) -> HashSet<String> {
    doc.iter()
        .filter_map(|(key, value)| match value.as_str() {
            Some(s) => Some(s.trim().to_string()),
            None => {
                debug!(field = %key, "Ignoring non-string blocklist value");
                None
            }
        })
        .filter(|s| !s.is_empty())
        .collect()
}
