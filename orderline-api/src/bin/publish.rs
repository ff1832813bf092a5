//! Publishes every file in `ORDERLINE_PUBLISH_DIR` as one order message.

use orderline_api::telemetry::init_tracing;
use orderline_api::{bus, ApiResult, PublisherConfig};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = PublisherConfig::from_env()?;
    init_tracing(config.log_format)?;

    let client = bus::connect(&config.bus).await?;
    let report = bus::publish_dir(&client, &config.bus.subject, &config.dir).await?;

    tracing::info!(
        dir = %config.dir.display(),
        subject = %config.bus.subject,
        published = report.published,
        failed = report.failed,
        "Publishing finished"
    );
    Ok(())
}
