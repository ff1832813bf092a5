//! HTTP Routes
//!
//! - Order lookups (`/`, `/orders/:uid`, `/process`)
//! - Health check endpoints (Kubernetes-compatible)
//! - Prometheus metrics and the OpenAPI document

pub mod health;
pub mod orders;

use std::time::Duration;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::openapi::ApiDoc;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

/// Upper bound on a single request, store fallback included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the complete application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(orders::index))
        .route("/orders/:uid", get(orders::get_order))
        .route("/process", post(orders::process))
        .nest("/health", health::create_router())
        .route("/metrics", get(metrics_handler))
        .route("/openapi.json", get(openapi_json))
        .layer(from_fn(observability_middleware))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
