//! Per-endpoint request counters.
//!
//! Counts are cumulative for the life of the process; flushing a summary
//! reads them but never resets them. Each endpoint remembers the collection
//! of the request that last touched it.

use dashmap::DashMap;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointCount {
    pub endpoint: String,
    pub requests: u64,
    pub collection: String,
}

#[derive(Debug)]
struct Tally {
    requests: u64,
    collection: String,
}

#[derive(Debug, Default)]
pub struct EndpointCounters {
    tallies: DashMap<String, Tally>,
}

impl EndpointCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request to `endpoint`. Returns the new total.
    pub fn increment(&self, endpoint: &str, collection: &str) -> u64 {
        // The shard lock held by `entry` serializes updates per endpoint.
        let mut tally = self
            .tallies
            .entry(endpoint.to_string())
            .or_insert_with(|| Tally {
                requests: 0,
                collection: collection.to_string(),
            });
        tally.requests += 1;
        if tally.collection != collection {
            tally.collection = collection.to_string();
        }
        tally.requests
    }

    pub fn get(&self, endpoint: &str) -> Option<EndpointCount> {
        self.tallies.get(endpoint).map(|t| EndpointCount {
            endpoint: endpoint.to_string(),
            requests: t.requests,
            collection: t.collection.clone(),
        })
    }

    /// All counters, sorted by endpoint.
    pub fn snapshot(&self) -> Vec<EndpointCount> {
        let mut counts: Vec<EndpointCount> = self
            .tallies
            .iter()
            .map(|e| EndpointCount {
                endpoint: e.key().clone(),
                requests: e.requests,
                collection: e.collection.clone(),
            })
            .collect();
        counts.sort_by(|a, b| a.endpoint.cmp(&b.endpoint));
        counts
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }
}
