//! Record store selected at startup.

use async_trait::async_trait;
use bytes::Bytes;
use orderline_core::{OrderRecord, StoreError};
use orderline_storage::{InMemoryRecordStore, RecordStore, ScannedRow};

use crate::config::{ServiceConfig, StoreBackend};
use crate::db::PgRecordStore;

/// The record store behind the service, chosen by `ORDERLINE_STORE`.
pub enum OrderStore {
    Postgres(PgRecordStore),
    Memory(InMemoryRecordStore),
}

impl OrderStore {
    /// Build the configured store, applying the schema when asked to.
    pub async fn connect(config: &ServiceConfig) -> Result<Self, StoreError> {
        match config.store {
            StoreBackend::Postgres => {
                let store = PgRecordStore::from_config(&config.db)?;
                if config.db.init_schema {
                    store.init_schema().await?;
                }
                Ok(Self::Postgres(store))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory record store; orders will not survive a restart");
                Ok(Self::Memory(InMemoryRecordStore::new()))
            }
        }
    }

    pub fn backend(&self) -> StoreBackend {
        match self {
            Self::Postgres(_) => StoreBackend::Postgres,
            Self::Memory(_) => StoreBackend::Memory,
        }
    }
}

impl From<InMemoryRecordStore> for OrderStore {
    fn from(store: InMemoryRecordStore) -> Self {
        Self::Memory(store)
    }
}

impl From<PgRecordStore> for OrderStore {
    fn from(store: PgRecordStore) -> Self {
        Self::Postgres(store)
    }
}

#[async_trait]
impl RecordStore for OrderStore {
    async fn query_all(&self) -> Result<Vec<ScannedRow>, StoreError> {
        match self {
            Self::Postgres(store) => store.query_all().await,
            Self::Memory(store) => store.query_all().await,
        }
    }

    async fn query_one(&self, identifier: &str) -> Result<Option<Bytes>, StoreError> {
        match self {
            Self::Postgres(store) => store.query_one(identifier).await,
            Self::Memory(store) => store.query_one(identifier).await,
        }
    }

    async fn insert(&self, record: &OrderRecord) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.insert(record).await,
            Self::Memory(store) => store.insert(record).await,
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(store) => store.health_check().await,
            Self::Memory(store) => store.health_check().await,
        }
    }
}
