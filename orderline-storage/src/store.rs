//! Record store collaborator.
//!
//! The durable `uid -> payload` table is the cache's source of truth and
//! recovery point. The API crate backs this with PostgreSQL; an in-memory
//! implementation lives here for tests and local development.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use orderline_core::{OrderRecord, StoreError};

/// One row of a full table scan. Rows decode independently so that a single
/// bad row can be reported without failing the whole enumeration.
pub type ScannedRow = Result<OrderRecord, StoreError>;

/// Durable storage of order records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Enumerate every stored row. The outer error means the enumeration
    /// query itself failed.
    async fn query_all(&self) -> Result<Vec<ScannedRow>, StoreError>;

    /// Fetch one payload by uid; `Ok(None)` when no row matches.
    async fn query_one(&self, identifier: &str) -> Result<Option<Bytes>, StoreError>;

    /// Write a record, replacing any existing row with the same uid.
    async fn insert(&self, record: &OrderRecord) -> Result<(), StoreError>;

    /// Cheap connectivity probe for readiness checks.
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// A row as held by [`InMemoryRecordStore`]. `None` models a row whose
/// payload column cannot be decoded.
type StoredRow = Option<Bytes>;

/// In-memory record store with failure injection.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    rows: RwLock<BTreeMap<String, StoredRow>>,
    unavailable: AtomicBool,
    reject_writes: AtomicBool,
    lookups: AtomicU64,
    writes: AtomicU64,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with the given records.
    pub fn with_records(records: impl IntoIterator<Item = OrderRecord>) -> Self {
        let store = Self::new();
        if let Ok(mut rows) = store.rows.write() {
            for record in records {
                rows.insert(record.identifier, Some(record.payload));
            }
        }
        store
    }

    /// Write a row directly, as an external writer bypassing the pipeline
    /// would.
    pub fn put_raw(&self, identifier: &str, payload: Bytes) -> Result<(), StoreError> {
        self.rows_mut()?.insert(identifier.to_string(), Some(payload));
        Ok(())
    }

    /// Store a row whose payload cannot be decoded.
    pub fn put_undecodable(&self, identifier: &str) -> Result<(), StoreError> {
        self.rows_mut()?.insert(identifier.to_string(), None);
        Ok(())
    }

    /// Make every operation fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make inserts fail with [`StoreError::WriteRejected`].
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of `query_one` calls served.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of successful inserts.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.rows
            .read()
            .map(|rows| rows.contains_key(identifier))
            .unwrap_or(false)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "in-memory store marked unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn rows_mut(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, StoredRow>>, StoreError> {
        self.rows.write().map_err(|_| StoreError::Unavailable {
            reason: "Storage lock poisoned".to_string(),
        })
    }

    fn rows_ref(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, StoredRow>>, StoreError> {
        self.rows.read().map_err(|_| StoreError::Unavailable {
            reason: "Storage lock poisoned".to_string(),
        })
    }
}

fn undecodable(identifier: &str) -> StoreError {
    StoreError::RowDecode {
        reason: format!("payload column for {} is not decodable", identifier),
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn query_all(&self) -> Result<Vec<ScannedRow>, StoreError> {
        self.check_available()?;
        let rows = self.rows_ref()?;
        Ok(rows
            .iter()
            .map(|(identifier, row)| match row {
                Some(payload) => Ok(OrderRecord::new(identifier.clone(), payload.clone())),
                None => Err(undecodable(identifier)),
            })
            .collect())
    }

    async fn query_one(&self, identifier: &str) -> Result<Option<Bytes>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let rows = self.rows_ref()?;
        match rows.get(identifier) {
            Some(Some(payload)) => Ok(Some(payload.clone())),
            Some(None) => Err(undecodable(identifier)),
            None => Ok(None),
        }
    }

    async fn insert(&self, record: &OrderRecord) -> Result<(), StoreError> {
        self.check_available()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected {
                identifier: record.identifier.clone(),
                reason: "in-memory store rejecting writes".to_string(),
            });
        }
        self.rows_mut()?
            .insert(record.identifier.clone(), Some(record.payload.clone()));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}
