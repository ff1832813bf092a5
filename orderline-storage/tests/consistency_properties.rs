//! Property-Based Tests for the Ingestion / Cache Consistency Contract
//!
//! Exercises the ingestion pipeline, read-through service and warm-start
//! loader together over a shared in-memory cache and record store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use orderline_core::{validate_order, IngestError, OrderRecord, ReadError, StoreError};
use orderline_storage::{
    CacheBackend, InMemoryCache, InMemoryRecordStore, IngestionPipeline, ReadThroughService,
    RecordStore, ScannedRow, WarmStartLoader, WarmStartPolicy,
};
use orderline_test_utils::{fixtures, generators::*};
use proptest::prelude::*;
use tokio::runtime::Runtime;
use tokio::sync::Notify;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

struct Harness {
    cache: Arc<InMemoryCache>,
    store: Arc<InMemoryRecordStore>,
    pipeline: IngestionPipeline<InMemoryCache, InMemoryRecordStore>,
    reads: ReadThroughService<InMemoryCache, InMemoryRecordStore>,
}

impl Harness {
    fn new() -> Self {
        Self::with_store(InMemoryRecordStore::new())
    }

    fn with_store(store: InMemoryRecordStore) -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let store = Arc::new(store);
        Self {
            pipeline: IngestionPipeline::new(Arc::clone(&cache), Arc::clone(&store)),
            reads: ReadThroughService::new(Arc::clone(&cache), Arc::clone(&store)),
            cache,
            store,
        }
    }
}

fn test_runtime() -> Result<Runtime, TestCaseError> {
    Runtime::new().map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

fn fail(e: impl std::fmt::Display) -> TestCaseError {
    TestCaseError::fail(e.to_string())
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever was ingested last is exactly what the next read returns.
    #[test]
    fn prop_write_then_read_consistency((order, body) in arb_order_message()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let harness = Harness::new();

            let outcome = harness.pipeline.ingest(&body).await.map_err(fail)?;
            let expected = validate_order(&body).map_err(fail)?;

            let read = harness.reads.get(&order.order_uid).await.map_err(fail)?;
            prop_assert_eq!(outcome.identifier, order.order_uid);
            prop_assert!(read.was_cache_hit());
            prop_assert_eq!(read.into_payload(), expected.payload);
            Ok(())
        })?;
    }

    /// Applying the same update twice is indistinguishable from applying it once.
    #[test]
    fn prop_idempotent_cache_update(uid in arb_order_uid(), payload in proptest::collection::vec(any::<u8>(), 0..128)) {
        let once = InMemoryCache::new();
        let twice = InMemoryCache::new();
        let payload = Bytes::from(payload);

        once.update(&uid, payload.clone());
        twice.update(&uid, payload.clone());
        twice.update(&uid, payload.clone());

        prop_assert_eq!(once.read(&uid), twice.read(&uid));
        prop_assert_eq!(once.len(), twice.len());
    }

    /// A message without a uid never reaches the store or the cache.
    #[test]
    fn prop_validation_rejection_writes_nothing(locale in "[a-z]{2}", sm_id in any::<i64>()) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let harness = Harness::new();
            let body = serde_json::json!({"order_uid": "", "locale": locale, "sm_id": sm_id});

            let err = harness.pipeline.ingest(body.to_string().as_bytes()).await;

            prop_assert_eq!(err, Err(IngestError::MissingIdentifier));
            prop_assert_eq!(harness.store.writes(), 0);
            prop_assert!(harness.cache.is_empty());
            Ok(())
        })?;
    }

    /// N pre-existing rows are all servable from the cache after warm start.
    #[test]
    fn prop_warm_start_completeness(orders in proptest::collection::vec(arb_order(), 0..16)) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let records = orders
                .iter()
                .map(|order| {
                    serde_json::to_vec(order)
                        .map_err(fail)
                        .and_then(|body| validate_order(&body).map_err(fail))
                })
                .collect::<Result<Vec<OrderRecord>, _>>()?;
            let harness = Harness::with_store(InMemoryRecordStore::with_records(records.clone()));

            WarmStartLoader::new(
                Arc::clone(&harness.cache),
                Arc::clone(&harness.store),
                WarmStartPolicy::SkipMalformed,
            )
            .load()
            .await
            .map_err(fail)?;

            // The last record per uid is the one the store kept.
            for record in &records {
                let stored = harness.store.query_one(&record.identifier).await.map_err(fail)?;
                prop_assert_eq!(harness.cache.read(&record.identifier), stored);
            }
            prop_assert_eq!(harness.store.lookups() as usize, records.len());
            Ok(())
        })?;
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[tokio::test]
async fn test_cold_read_repair_after_external_insert() -> Result<(), ReadError> {
    let harness = Harness::new();
    let record = fixtures::minimal_record("X").map_err(|e| ReadError::StoreUnavailable {
        reason: e.to_string(),
    })?;
    harness.store.insert(&record).await?;
    assert_eq!(harness.cache.read("X"), None);

    let read = harness.reads.get("X").await?;

    assert!(read.was_cache_miss());
    assert_eq!(read.payload(), &record.payload);
    assert_eq!(harness.cache.read("X"), Some(record.payload));
    Ok(())
}

#[tokio::test]
async fn test_persistence_failure_atomicity() {
    let harness = Harness::new();
    harness.store.set_reject_writes(true);

    let result = harness.pipeline.ingest(&fixtures::minimal_message("Y")).await;

    assert!(matches!(result, Err(IngestError::PersistenceFailure { .. })));
    assert_eq!(harness.cache.read("Y"), None);
    assert!(matches!(
        harness.reads.get("Y").await,
        Err(ReadError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_unknown_identifier_is_not_found() {
    let harness = Harness::new();
    harness
        .pipeline
        .ingest(&fixtures::sample_order_message())
        .await
        .expect("sample order ingests");

    let result = harness.reads.get("does-not-exist").await;

    assert_eq!(
        result.map(|read| read.into_payload()),
        Err(ReadError::NotFound {
            identifier: "does-not-exist".to_string()
        })
    );
}

#[tokio::test]
async fn test_concurrent_reads_during_ingestion() -> Result<(), Box<dyn std::error::Error>> {
    let harness = Arc::new(Harness::new());
    // Seed the store only, so readers race the writer through the
    // miss-and-repair path.
    harness.store.insert(&fixtures::minimal_record("hot")?).await?;

    let writer = {
        let harness = Arc::clone(&harness);
        tokio::spawn(async move {
            for locale in ["en", "ru", "de", "fr"] {
                let body = serde_json::json!({"order_uid": "hot", "locale": locale});
                harness.pipeline.ingest(body.to_string().as_bytes()).await?;
            }
            Ok::<_, IngestError>(())
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let harness = Arc::clone(&harness);
        readers.push(tokio::spawn(async move {
            let read = harness.reads.get("hot").await?;
            validate_order(read.payload()).map_err(|e| ReadError::DecodeFailure {
                identifier: "hot".to_string(),
                reason: e.to_string(),
            })
        }));
    }

    writer.await??;
    for reader in readers {
        let record = reader.await??;
        assert_eq!(record.identifier, "hot");
    }

    // Last ingestion wins once everything has settled.
    let stored = harness.store.query_one("hot").await?;
    assert!(stored.is_some());
    assert_eq!(harness.cache.read("hot"), stored);
    Ok(())
}

/// Record store that parks `query_one` after fetching, until released.
struct GatedStore {
    inner: InMemoryRecordStore,
    fetched: Notify,
    release: Notify,
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn query_all(&self) -> Result<Vec<ScannedRow>, StoreError> {
        self.inner.query_all().await
    }

    async fn query_one(&self, identifier: &str) -> Result<Option<Bytes>, StoreError> {
        let row = self.inner.query_one(identifier).await?;
        self.fetched.notify_one();
        self.release.notified().await;
        Ok(row)
    }

    async fn insert(&self, record: &OrderRecord) -> Result<(), StoreError> {
        self.inner.insert(record).await
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }
}

#[tokio::test]
async fn test_ingest_during_store_fallback_is_not_overwritten() -> Result<(), Box<dyn std::error::Error>> {
    let cache = Arc::new(InMemoryCache::new());
    let store = Arc::new(GatedStore {
        inner: InMemoryRecordStore::new(),
        fetched: Notify::new(),
        release: Notify::new(),
    });
    let old = Bytes::from_static(br#"{"order_uid":"K","v":1}"#);
    store.inner.put_raw("K", old.clone())?;

    let pipeline = IngestionPipeline::new(Arc::clone(&cache), Arc::clone(&store));
    let reads = ReadThroughService::new(Arc::clone(&cache), Arc::clone(&store));

    let reader = tokio::spawn(async move { reads.get("K").await });
    store.fetched.notified().await;

    // The reader holds the old row; a newer order lands meanwhile.
    let body = br#"{"order_uid":"K","locale":"ru"}"#;
    pipeline.ingest(body).await?;
    let newer = validate_order(body)?.payload;
    store.release.notify_one();

    let read = reader.await??;
    assert!(read.payload() == &old || read.payload() == &newer);

    assert_eq!(cache.read("K"), Some(newer.clone()));
    assert_eq!(store.inner.query_one("K").await?, Some(newer));
    Ok(())
}
