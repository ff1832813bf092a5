//! Concurrent in-memory cache backend.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use dashmap::DashMap;

use super::traits::{CacheBackend, CacheStats};

/// Sharded concurrent map of uid to payload with hit/miss counters.
///
/// Memory grows with the number of distinct uids ever seen; nothing is
/// evicted.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, Bytes>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheBackend for InMemoryCache {
    fn read(&self, identifier: &str) -> Option<Bytes> {
        match self.entries.get(identifier) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(uid = identifier, "from cache");
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn update(&self, identifier: &str, payload: Bytes) {
        self.entries.insert(identifier.to_string(), payload);
    }

    fn repair(&self, identifier: &str, payload: Bytes) -> Bytes {
        self.entries
            .entry(identifier.to_string())
            .or_insert(payload)
            .value()
            .clone()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entries.len() as u64,
        }
    }
}
