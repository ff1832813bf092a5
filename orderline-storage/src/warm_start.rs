//! Warm-start loader.
//!
//! Runs once at boot, before the pipeline and the read path accept work, and
//! copies every stored row into the cache so historical orders never take a
//! cold miss.

use std::str::FromStr;
use std::sync::Arc;

use orderline_core::{ConfigError, StoreError};

use crate::cache::CacheBackend;
use crate::store::RecordStore;

/// What to do with a row that cannot be decoded during warm start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarmStartPolicy {
    /// Log the row and keep loading the rest.
    #[default]
    SkipMalformed,
    /// Fail the whole load on the first bad row.
    AbortOnMalformed,
}

impl FromStr for WarmStartPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "skip" | "skip_malformed" => Ok(Self::SkipMalformed),
            "abort" | "abort_on_malformed" => Ok(Self::AbortOnMalformed),
            other => Err(ConfigError::InvalidValue {
                field: "warm_start_policy".to_string(),
                value: other.to_string(),
                reason: "expected 'skip' or 'abort'".to_string(),
            }),
        }
    }
}

/// Counts from a completed warm start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmStartReport {
    pub loaded: usize,
    pub skipped: usize,
}

pub struct WarmStartLoader<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    cache: Arc<C>,
    store: Arc<S>,
    policy: WarmStartPolicy,
}

impl<C, S> WarmStartLoader<C, S>
where
    C: CacheBackend,
    S: RecordStore,
{
    pub fn new(cache: Arc<C>, store: Arc<S>, policy: WarmStartPolicy) -> Self {
        Self {
            cache,
            store,
            policy,
        }
    }

    /// Load every stored row into the cache.
    ///
    /// Fails if the enumeration itself fails. Undecodable rows are handled
    /// according to the configured [`WarmStartPolicy`].
    pub async fn load(&self) -> Result<WarmStartReport, StoreError> {
        let rows = self.store.query_all().await?;
        let mut report = WarmStartReport::default();

        for row in rows {
            match row {
                Ok(record) => {
                    self.cache.update(&record.identifier, record.payload);
                    report.loaded += 1;
                }
                Err(e) => match self.policy {
                    WarmStartPolicy::SkipMalformed => {
                        tracing::warn!(error = %e, "Skipping undecodable row during warm start");
                        report.skipped += 1;
                    }
                    WarmStartPolicy::AbortOnMalformed => {
                        tracing::error!(error = %e, "Aborting warm start on undecodable row");
                        return Err(e);
                    }
                },
            }
        }

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped,
            "Data added to cache"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use crate::store::InMemoryRecordStore;
    use bytes::Bytes;
    use orderline_core::OrderRecord;

    fn records(n: usize) -> Vec<OrderRecord> {
        (0..n)
            .map(|i| OrderRecord::new(format!("order-{}", i), format!("payload-{}", i)))
            .collect()
    }

    #[tokio::test]
    async fn test_loads_every_row() -> Result<(), StoreError> {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(InMemoryRecordStore::with_records(records(5)));

        let report = WarmStartLoader::new(Arc::clone(&cache), store, WarmStartPolicy::default())
            .load()
            .await?;

        assert_eq!(report, WarmStartReport { loaded: 5, skipped: 0 });
        for i in 0..5 {
            assert_eq!(
                cache.read(&format!("order-{}", i)),
                Some(Bytes::from(format!("payload-{}", i)))
            );
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_skip_policy_continues_past_bad_rows() -> Result<(), StoreError> {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(InMemoryRecordStore::with_records(records(3)));
        store.put_undecodable("broken")?;

        let report = WarmStartLoader::new(
            Arc::clone(&cache),
            store,
            WarmStartPolicy::SkipMalformed,
        )
        .load()
        .await?;

        assert_eq!(report, WarmStartReport { loaded: 3, skipped: 1 });
        assert_eq!(cache.len(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_abort_policy_fails_on_bad_row() -> Result<(), StoreError> {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(InMemoryRecordStore::with_records(records(3)));
        store.put_undecodable("broken")?;

        let result = WarmStartLoader::new(cache, store, WarmStartPolicy::AbortOnMalformed)
            .load()
            .await;

        assert!(matches!(result, Err(StoreError::RowDecode { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_enumeration_failure_is_fatal() {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(InMemoryRecordStore::with_records(records(2)));
        store.set_unavailable(true);

        let result = WarmStartLoader::new(Arc::clone(&cache), store, WarmStartPolicy::default())
            .load()
            .await;

        assert!(matches!(result, Err(StoreError::Unavailable { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("skip".parse(), Ok(WarmStartPolicy::SkipMalformed));
        assert_eq!(" ABORT ".parse(), Ok(WarmStartPolicy::AbortOnMalformed));
        assert!("sometimes".parse::<WarmStartPolicy>().is_err());
    }
}
