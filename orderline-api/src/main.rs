//! Orderline API Server Entry Point
//!
//! Loads configuration, fills the cache from the record store, starts the
//! bus consumer and serves HTTP until interrupted.

use orderline_api::telemetry::{init_tracing, with_metrics};
use orderline_api::{bus, create_router, ApiError, ApiResult, AppState, Components, OrderStore, ServiceConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = ServiceConfig::from_env()?;
    init_tracing(config.log_format)?;

    let store = OrderStore::connect(&config).await?;
    tracing::info!(backend = ?store.backend(), "Record store ready");
    let components = Components::new(store);

    // The cache must be complete before anything is served.
    let report = components
        .warm_start(config.warm_start)
        .load()
        .await
        .map_err(|e| ApiError::database_error(format!("Warm start failed: {}", e)))?;
    with_metrics(|metrics| metrics.set_cache_entries(components.cached_orders()));
    tracing::info!(loaded = report.loaded, skipped = report.skipped, "Cache warmed");

    let client = bus::connect(&config.bus).await?;
    let pipeline = components.pipeline();
    let bus_config = config.bus.clone();
    let consumer = tokio::spawn(async move {
        match bus_config.jetstream() {
            Some((stream, durable)) => {
                bus::run_jetstream(client, &bus_config, stream, durable, pipeline).await
            }
            None => bus::run_core(client, &bus_config, pipeline).await,
        }
    });

    let app = create_router(AppState::new(components.reads()));
    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Starting orderline API server");

    let server = axum::serve(listener, app);
    tokio::select! {
        result = server => {
            result.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
        }
        result = consumer => {
            let seen = result
                .map_err(|e| ApiError::internal_error(format!("Bus consumer panicked: {}", e)))??;
            tracing::error!(seen, "Bus consumer stopped");
            return Err(ApiError::bus_error("Bus consumer stopped"));
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
