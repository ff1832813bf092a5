//! Read-through service.
//!
//! Serves lookups by uid from the cache, falling back to the record store on
//! a miss and repairing the cache with what it finds. A miss can only happen
//! for rows an external writer put into the store behind the pipeline's back.

use std::sync::Arc;

use orderline_core::ReadError;

use crate::cache::{CacheBackend, CacheRead};
use crate::store::RecordStore;

/// Single read entry point shared by every HTTP route.
///
/// # Example
///
/// ```ignore
/// let service = ReadThroughService::new(cache, store);
/// let read = service.get("b563feb7b2b84b6test").await?;
/// if read.was_cache_miss() {
///     tracing::info!("served from store");
/// }
/// ```
pub struct ReadThroughService<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    cache: Arc<C>,
    store: Arc<S>,
}

impl<C, S> ReadThroughService<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    pub fn new(cache: Arc<C>, store: Arc<S>) -> Self {
        Self { cache, store }
    }

    /// Get a reference to the cache backend.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Get a reference to the record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look up an order payload.
    ///
    /// A concurrent ingestion of the same uid between the cache check and
    /// the store fetch may make this return either the old or the new
    /// payload; both are committed states and neither is ever torn. The
    /// repair itself never replaces an entry, so a payload cached by that
    /// ingestion stays in place.
    pub async fn get(&self, identifier: &str) -> Result<CacheRead, ReadError> {
        if identifier.is_empty() {
            return Err(ReadError::NotFound {
                identifier: String::new(),
            });
        }

        if let Some(payload) = self.cache.read(identifier) {
            return Ok(CacheRead::from_cache(payload));
        }

        tracing::info!(uid = identifier, "Cache miss, reading from store");
        let fetched = self
            .store
            .query_one(identifier)
            .await
            .map_err(|e| ReadError::from(e).for_identifier(identifier))?;

        match fetched {
            Some(payload) => Ok(CacheRead::from_storage(self.cache.repair(identifier, payload))),
            None => Err(ReadError::NotFound {
                identifier: identifier.to_string(),
            }),
        }
    }
}

impl<C, S> Clone for ReadThroughService<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            store: Arc::clone(&self.store),
        }
    }
}
