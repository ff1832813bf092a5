//! OpenAPI document for the orderline HTTP surface, served at
//! `/openapi.json`.

use utoipa::OpenApi;

use crate::error::{ApiError, ErrorCode};
use crate::routes::health::{
    CacheHealth, ComponentHealth, HealthDetails, HealthResponse, HealthStatus,
};
use crate::routes::{health, orders};
use crate::telemetry::metrics;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Orderline API",
        version = "0.1.0",
        description = "Read access to ingested orders, served from an in-memory cache backed by PostgreSQL",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Orders", description = "Order lookup by uid"),
        (name = "Health", description = "Liveness and readiness probes"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        orders::get_order,
        orders::process,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        ApiError,
        ErrorCode,
        orders::ProcessForm,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        ComponentHealth,
        CacheHealth,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_order_routes() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&ApiDoc::openapi())?;

        assert!(json.contains("/orders/{uid}"));
        assert!(json.contains("/process"));
        assert!(json.contains("/health/ready"));
        Ok(())
    }
}
