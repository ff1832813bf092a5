//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use orderline_storage::{
    CacheBackend, InMemoryCache, IngestionPipeline, ReadThroughService, WarmStartLoader,
    WarmStartPolicy,
};

use crate::store::OrderStore;

/// The read path as wired in the service.
pub type OrderReads = ReadThroughService<InMemoryCache, OrderStore>;

/// The ingestion path as wired in the service.
pub type OrderPipeline = IngestionPipeline<InMemoryCache, OrderStore>;

/// Owns the cache and the record store and hands out the three components
/// that share them. Built once at startup.
pub struct Components {
    pub cache: Arc<InMemoryCache>,
    pub store: Arc<OrderStore>,
}

impl Components {
    pub fn new(store: impl Into<OrderStore>) -> Self {
        Self {
            cache: Arc::new(InMemoryCache::new()),
            store: Arc::new(store.into()),
        }
    }

    pub fn reads(&self) -> OrderReads {
        ReadThroughService::new(Arc::clone(&self.cache), Arc::clone(&self.store))
    }

    pub fn pipeline(&self) -> OrderPipeline {
        IngestionPipeline::new(Arc::clone(&self.cache), Arc::clone(&self.store))
    }

    pub fn warm_start(&self, policy: WarmStartPolicy) -> WarmStartLoader<InMemoryCache, OrderStore> {
        WarmStartLoader::new(Arc::clone(&self.cache), Arc::clone(&self.store), policy)
    }

    pub fn cached_orders(&self) -> usize {
        self.cache.len()
    }
}

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Single read entry point used by every order route.
    pub reads: OrderReads,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(reads: OrderReads) -> Self {
        Self {
            reads,
            start_time: Instant::now(),
        }
    }
}

crate::impl_from_ref!(OrderReads, reads);
crate::impl_from_ref!(Instant, start_time);
