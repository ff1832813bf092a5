//! Orderline Storage - Cache, Record Store and Consistency Pipeline
//!
//! Everything between the durable record store and the HTTP read path:
//!
//! - [`cache`]: the in-memory uid -> payload cache
//! - [`store`]: the record store trait and an in-memory implementation
//! - [`pipeline`]: validate -> persist -> cache ingestion
//! - [`read_through`]: cache-first lookups with store fallback and repair
//! - [`warm_start`]: boot-time bulk load of the store into the cache
//!
//! The PostgreSQL record store lives in orderline-api.

pub mod cache;
pub mod pipeline;
pub mod read_through;
pub mod store;
pub mod warm_start;

pub use cache::{CacheBackend, CacheRead, CacheStats, InMemoryCache, ReadSource};
pub use pipeline::{IngestOutcome, IngestionPipeline};
pub use read_through::ReadThroughService;
pub use store::{InMemoryRecordStore, RecordStore, ScannedRow};
pub use warm_start::{WarmStartLoader, WarmStartPolicy, WarmStartReport};
