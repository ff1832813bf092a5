//! Order cache layer.
//!
//! The cache is the single authority for "is this uid fast-path servable".
//! It holds every order the process has seen, keyed by uid, and never
//! expires or evicts anything. The cache is an explicitly constructed value
//! shared (via `Arc`) by the ingestion pipeline, the read-through service and
//! the warm-start loader; there is no process-wide instance.

pub mod memory;
pub mod read;
pub mod traits;

pub use memory::InMemoryCache;
pub use read::{CacheRead, ReadSource};
pub use traits::{CacheBackend, CacheStats};
