//! Ingestion pipeline: validate -> persist -> cache.
//!
//! Invoked once per inbound message. Each stage short-circuits on failure,
//! and nothing reaches the cache without first being durable in the record
//! store. Failed messages are logged and dropped; there is no retry or
//! dead-letter path.

use std::sync::Arc;

use orderline_core::{validate_order, IngestError};

use crate::cache::CacheBackend;
use crate::store::RecordStore;

/// Result of a successfully ingested message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub identifier: String,
    pub payload_len: usize,
}

/// Sequential write path from the message bus into the store and cache.
pub struct IngestionPipeline<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    cache: Arc<C>,
    store: Arc<S>,
}

impl<C, S> IngestionPipeline<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    pub fn new(cache: Arc<C>, store: Arc<S>) -> Self {
        Self { cache, store }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Process one raw message body.
    ///
    /// On `Err` the cache has not been touched by this message, and for
    /// validation failures the store has not been touched either.
    pub async fn ingest(&self, content: &[u8]) -> Result<IngestOutcome, IngestError> {
        let record = validate_order(content)?;
        tracing::debug!(uid = %record.identifier, "Message validated");

        self.store
            .insert(&record)
            .await
            .map_err(|e| IngestError::PersistenceFailure {
                identifier: record.identifier.clone(),
                reason: e.to_string(),
            })?;

        let outcome = IngestOutcome {
            identifier: record.identifier.clone(),
            payload_len: record.payload.len(),
        };
        self.cache.update(&record.identifier, record.payload);
        tracing::info!(uid = %outcome.identifier, bytes = outcome.payload_len, "Message handled");

        Ok(outcome)
    }
}

impl<C, S> Clone for IngestionPipeline<C, S>
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
