//! Orderline Telemetry - structured logging and Prometheus metrics.

pub mod logging;
pub mod metrics;
pub mod middleware;

pub use logging::init_tracing;
pub use metrics::{metrics_handler, with_metrics, OrderlineMetrics, METRICS};
pub use middleware::observability_middleware;
