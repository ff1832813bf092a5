//! Cache backend trait and usage statistics.

use bytes::Bytes;

/// In-memory mapping from order uid to canonical payload.
///
/// Implementations must be safe under concurrent reads and concurrent
/// read/write. There is deliberately no delete, expire or evict operation:
/// an entry lives for as long as the process does and is only ever replaced
/// wholesale by a later `update` for the same uid.
pub trait CacheBackend: Send + Sync {
    /// Look up a payload. `None` means "not currently cached", never an error.
    ///
    /// The returned `Bytes` is an immutable view; the cache keeps ownership
    /// of its copy.
    fn read(&self, identifier: &str) -> Option<Bytes>;

    /// Insert or replace the payload for `identifier`.
    ///
    /// Idempotent: applying the same pair twice is observably the same as
    /// applying it once.
    fn update(&self, identifier: &str, payload: Bytes);

    /// Insert `payload` only if `identifier` is not cached yet, and return
    /// whichever value the cache holds afterwards.
    ///
    /// Used to fill the cache from a store read. An entry written by
    /// `update` in the meantime is newer than the fetched payload and wins.
    fn repair(&self, identifier: &str, payload: Bytes) -> Bytes;

    /// Number of distinct uids currently cached.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get cache statistics.
    fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
}
