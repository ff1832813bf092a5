//! PostgreSQL Record Store
//!
//! Connection pooling via deadpool-postgres and the `orders` table behind
//! the [`RecordStore`] trait. Payloads are stored as `BYTEA` so the bytes a
//! reader gets back are exactly the canonical bytes that were written.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use orderline_core::{ConfigError, OrderRecord, StoreError};
use orderline_storage::{RecordStore, ScannedRow};
use tokio_postgres::NoTls;

use crate::config::{bool_or, parse_or, string_or};

/// Schema applied at startup when `ORDERLINE_DB_INIT_SCHEMA` is set.
pub const SCHEMA: &str = include_str!("../migrations/0001_create_orders.sql");

const SELECT_ALL: &str = "SELECT uid, data FROM orders";
const SELECT_ONE: &str = "SELECT data FROM orders WHERE uid = $1";
const UPSERT: &str = "INSERT INTO orders (uid, data) VALUES ($1, $2) \
                      ON CONFLICT (uid) DO UPDATE SET data = EXCLUDED.data";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Full connection string; takes precedence over the discrete fields.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection and checkout timeout
    pub timeout: Duration,
    /// Create the `orders` table on startup if it does not exist.
    pub init_schema: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            dbname: "orders".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            max_size: 16,
            timeout: Duration::from_secs(30),
            init_schema: true,
        }
    }
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(&crate::config::env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            url: lookup("ORDERLINE_DB_URL").filter(|url| !url.trim().is_empty()),
            host: string_or(lookup, "ORDERLINE_DB_HOST", &defaults.host),
            port: parse_or(lookup, "ORDERLINE_DB_PORT", defaults.port)?,
            dbname: string_or(lookup, "ORDERLINE_DB_NAME", &defaults.dbname),
            user: string_or(lookup, "ORDERLINE_DB_USER", &defaults.user),
            password: string_or(lookup, "ORDERLINE_DB_PASSWORD", &defaults.password),
            max_size: parse_or(lookup, "ORDERLINE_DB_POOL_SIZE", defaults.max_size)?,
            timeout: Duration::from_secs(parse_or(
                lookup,
                "ORDERLINE_DB_TIMEOUT",
                defaults.timeout.as_secs(),
            )?),
            init_schema: bool_or(lookup, "ORDERLINE_DB_INIT_SCHEMA", defaults.init_schema)?,
        })
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first checkout does that.
    pub fn create_pool(&self) -> Result<Pool, StoreError> {
        let mut cfg = Config::new();
        match &self.url {
            Some(url) => cfg.url = Some(url.clone()),
            None => {
                cfg.host = Some(self.host.clone());
                cfg.port = Some(self.port);
                cfg.dbname = Some(self.dbname.clone());
                cfg.user = Some(self.user.clone());
                cfg.password = Some(self.password.clone());
            }
        }

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        let mut pool = PoolConfig::new(self.max_size);
        pool.timeouts.wait = Some(self.timeout);
        pool.timeouts.create = Some(self.timeout);
        pool.timeouts.recycle = Some(self.timeout);
        cfg.pool = Some(pool);

        cfg.create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| unavailable(format!("Failed to create pool: {}", e)))
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

fn unavailable(reason: impl Into<String>) -> StoreError {
    StoreError::Unavailable {
        reason: reason.into(),
    }
}

/// The `orders` table as a [`RecordStore`].
#[derive(Clone)]
pub struct PgRecordStore {
    pool: Pool,
}

impl PgRecordStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_config(config: &DbConfig) -> Result<Self, StoreError> {
        Ok(Self::new(config.create_pool()?))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> Result<deadpool_postgres::Object, StoreError> {
        self.pool
            .get()
            .await
            .map_err(|e| unavailable(format!("Failed to acquire connection: {}", e)))
    }

    /// Create the `orders` table if it does not exist.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA)
            .await
            .map_err(|e| unavailable(format!("Failed to apply schema: {}", e)))?;
        tracing::info!("Orders table ready");
        Ok(())
    }
}

fn decode_row(row: &tokio_postgres::Row) -> ScannedRow {
    let uid: String = row.try_get(0).map_err(|e| StoreError::RowDecode {
        reason: format!("uid column: {}", e),
    })?;
    let data: Vec<u8> = row.try_get(1).map_err(|e| StoreError::RowDecode {
        reason: format!("data column for {}: {}", uid, e),
    })?;
    Ok(OrderRecord::new(uid, data))
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn query_all(&self) -> Result<Vec<ScannedRow>, StoreError> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(SELECT_ALL, &[])
            .await
            .map_err(|e| unavailable(format!("Failed to enumerate orders: {}", e)))?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn query_one(&self, identifier: &str) -> Result<Option<Bytes>, StoreError> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(SELECT_ONE, &[&identifier])
            .await
            .map_err(|e| unavailable(format!("Failed to fetch order: {}", e)))?;

        match row {
            None => Ok(None),
            Some(row) => {
                let data: Vec<u8> = row.try_get(0).map_err(|e| StoreError::RowDecode {
                    reason: e.to_string(),
                })?;
                Ok(Some(Bytes::from(data)))
            }
        }
    }

    async fn insert(&self, record: &OrderRecord) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        let data: &[u8] = &record.payload;
        conn.execute(UPSERT, &[&record.identifier, &data])
            .await
            .map_err(|e| StoreError::WriteRejected {
                identifier: record.identifier.clone(),
                reason: e.to_string(),
            })?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| unavailable(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
