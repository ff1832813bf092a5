//! Prometheus Metrics Definitions
//!
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use orderline_core::IngestError;
use orderline_storage::ReadSource;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized on first use
pub static METRICS: Lazy<ApiResult<OrderlineMetrics>> = Lazy::new(OrderlineMetrics::new);

/// Run `f` against the global metrics if they registered successfully.
pub fn with_metrics(f: impl FnOnce(&OrderlineMetrics)) {
    if let Ok(metrics) = METRICS.as_ref() {
        f(metrics);
    }
}

/// Label for an ingestion result.
pub fn ingest_outcome<T>(result: &Result<T, IngestError>) -> &'static str {
    match result {
        Ok(_) => "handled",
        Err(IngestError::MalformedInput { .. }) => "malformed",
        Err(IngestError::MissingIdentifier) => "missing_uid",
        Err(IngestError::PersistenceFailure { .. }) => "persistence_failure",
    }
}

fn registration_error(name: &str, e: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, e))
}

#[derive(Clone)]
pub struct OrderlineMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: IntCounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Bus messages by outcome - labels: outcome
    pub ingest_messages_total: IntCounterVec,

    /// Successful reads by where they were served from - labels: source
    pub reads_total: IntCounterVec,

    /// Current number of cached orders
    pub cache_entries: IntGauge,
}

impl OrderlineMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_int_counter_vec!(
                "orderline_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_error("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "orderline_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_error("http_request_duration_seconds", e))?,

            ingest_messages_total: register_int_counter_vec!(
                "orderline_ingest_messages_total",
                "Bus messages processed by the ingestion pipeline",
                &["outcome"]
            )
            .map_err(|e| registration_error("ingest_messages_total", e))?,

            reads_total: register_int_counter_vec!(
                "orderline_reads_total",
                "Orders served by the read path",
                &["source"]
            )
            .map_err(|e| registration_error("reads_total", e))?,

            cache_entries: register_int_gauge!(
                "orderline_cache_entries",
                "Current number of cached orders"
            )
            .map_err(|e| registration_error("cache_entries", e))?,
        })
    }

    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_ingest(&self, outcome: &str) {
        self.ingest_messages_total.with_label_values(&[outcome]).inc();
    }

    pub fn record_read(&self, source: ReadSource) {
        self.reads_total.with_label_values(&[source.as_str()]).inc();
    }

    pub fn set_cache_entries(&self, count: usize) {
        self.cache_entries
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    // Make sure the orderline families exist even before the first request.
    Lazy::force(&METRICS);

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
