//! Result type of a read-through lookup.

use bytes::Bytes;

/// Where a served payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    /// Fast path: the uid was already cached.
    Cache,
    /// Cache miss repaired from the record store.
    Store,
}

impl ReadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadSource::Cache => "cache",
            ReadSource::Store => "store",
        }
    }
}

/// A served payload together with where it was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRead {
    payload: Bytes,
    source: ReadSource,
}

impl CacheRead {
    /// Create a new cache read from a cache hit.
    pub fn from_cache(payload: Bytes) -> Self {
        Self {
            payload,
            source: ReadSource::Cache,
        }
    }

    /// Create a new cache read from a storage fetch (cache miss).
    pub fn from_storage(payload: Bytes) -> Self {
        Self {
            payload,
            source: ReadSource::Store,
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Consume the wrapper and return the payload.
    pub fn into_payload(self) -> Bytes {
        self.payload
    }

    pub fn source(&self) -> ReadSource {
        self.source
    }

    pub fn was_cache_hit(&self) -> bool {
        self.source == ReadSource::Cache
    }

    pub fn was_cache_miss(&self) -> bool {
        self.source == ReadSource::Store
    }
}
