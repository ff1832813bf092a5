//! Orderline API - HTTP, Message Bus and PostgreSQL Layer
//!
//! Wires the storage crate's cache, ingestion pipeline and read-through
//! service to the outside world: an Axum HTTP server for lookups, a NATS
//! consumer for ingestion and a deadpool-postgres record store.

pub mod bus;
pub mod config;
pub mod db;
pub mod error;
mod macros;
pub mod openapi;
pub mod routes;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::{BusConfig, LogFormat, PublisherConfig, ServerConfig, ServiceConfig, StoreBackend};
pub use db::{DbConfig, PgRecordStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::{AppState, Components, OrderPipeline, OrderReads};
pub use store::OrderStore;
