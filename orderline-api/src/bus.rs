//! NATS Message Bus
//!
//! The consumer side feeds every message, one at a time and in arrival
//! order, into the ingestion pipeline. A message is handled exactly once from
//! the service's point of view: failures are logged and counted, never
//! retried. The publisher side replays a directory of order files onto the
//! subject.

use std::path::{Path, PathBuf};

use async_nats::jetstream::{self, consumer::PullConsumer};
use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use orderline_storage::{CacheBackend, IngestionPipeline, RecordStore};

use crate::config::BusConfig;
use crate::error::{ApiError, ApiResult};
use crate::telemetry::metrics::{ingest_outcome, with_metrics};

/// Connect to the NATS server named in the configuration.
pub async fn connect(config: &BusConfig) -> ApiResult<async_nats::Client> {
    let client = async_nats::ConnectOptions::new()
        .name(config.client_name.as_str())
        .connect(config.url.as_str())
        .await
        .map_err(|e| {
            ApiError::bus_error(format!(
                "Can't connect to NATS at {}: {}. Make sure a NATS server is running",
                config.url, e
            ))
        })?;

    tracing::info!(url = %config.url, client = %config.client_name, "Connected to NATS");
    Ok(client)
}

// ============================================================================
// CONSUMER
// ============================================================================

/// Run one message through the pipeline, recording the outcome.
async fn handle_message<C, S>(pipeline: &IngestionPipeline<C, S>, payload: &[u8])
where
    C: CacheBackend,
    S: RecordStore,
{
    let result = pipeline.ingest(payload).await;
    let outcome = ingest_outcome(&result);

    if let Err(e) = &result {
        tracing::warn!(error = %e, outcome, "Message dropped");
    }

    let cached = pipeline.cache().len();
    with_metrics(|metrics| {
        metrics.record_ingest(outcome);
        metrics.set_cache_entries(cached);
    });
}

/// Process payloads sequentially until the stream ends. Returns the number
/// of messages seen.
pub async fn drain<C, S, M>(pipeline: &IngestionPipeline<C, S>, messages: M) -> usize
where
    C: CacheBackend,
    S: RecordStore,
    M: Stream<Item = Bytes>,
{
    pin_mut!(messages);

    let mut seen = 0;
    while let Some(payload) = messages.next().await {
        handle_message(pipeline, &payload).await;
        seen += 1;
    }
    seen
}

/// Consume from a core NATS subscription, in a queue group when one is
/// configured. Returns when the subscription closes.
pub async fn run_core<C, S>(
    client: async_nats::Client,
    config: &BusConfig,
    pipeline: IngestionPipeline<C, S>,
) -> ApiResult<usize>
where
    C: CacheBackend,
    S: RecordStore,
{
    let subscriber = match &config.queue_group {
        Some(group) => client
            .queue_subscribe(config.subject.clone(), group.clone())
            .await,
        None => client.subscribe(config.subject.clone()).await,
    }
    .map_err(|e| ApiError::bus_error(format!("Failed to subscribe: {}", e)))?;

    tracing::info!(
        subject = %config.subject,
        queue_group = ?config.queue_group,
        "Listening for orders"
    );

    let seen = drain(&pipeline, subscriber.map(|message| message.payload)).await;
    tracing::warn!(seen, "Subscription closed");
    Ok(seen)
}

/// Consume from a durable JetStream pull consumer.
///
/// Each message is acknowledged after the pipeline has run, whatever the
/// outcome, so a rejected message is not redelivered.
pub async fn run_jetstream<C, S>(
    client: async_nats::Client,
    config: &BusConfig,
    stream_name: &str,
    durable: &str,
    pipeline: IngestionPipeline<C, S>,
) -> ApiResult<usize>
where
    C: CacheBackend,
    S: RecordStore,
{
    let context = jetstream::new(client);

    let stream = context
        .get_or_create_stream(jetstream::stream::Config {
            name: stream_name.to_string(),
            subjects: vec![config.subject.clone()],
            ..Default::default()
        })
        .await
        .map_err(|e| ApiError::bus_error(format!("Failed to create stream: {}", e)))?;

    let consumer: PullConsumer = stream
        .get_or_create_consumer(
            durable,
            jetstream::consumer::pull::Config {
                durable_name: Some(durable.to_string()),
                ack_policy: jetstream::consumer::AckPolicy::Explicit,
                filter_subject: config.subject.clone(),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| ApiError::bus_error(format!("Failed to create consumer: {}", e)))?;

    let mut messages = consumer
        .messages()
        .await
        .map_err(|e| ApiError::bus_error(format!("Failed to open message stream: {}", e)))?;

    tracing::info!(
        stream = stream_name,
        durable,
        subject = %config.subject,
        "Listening for orders"
    );

    let mut seen = 0;
    while let Some(next) = messages.next().await {
        match next {
            Ok(message) => {
                handle_message(&pipeline, &message.payload).await;
                if let Err(e) = message.ack().await {
                    tracing::warn!(error = %e, "Failed to ack message");
                }
                seen += 1;
            }
            Err(e) => tracing::warn!(error = %e, "Error receiving message"),
        }
    }

    tracing::warn!(seen, "JetStream consumer closed");
    Ok(seen)
}

// ============================================================================
// PUBLISHER
// ============================================================================

/// Counts from a directory replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub published: usize,
    pub failed: usize,
}

/// Regular files in `dir`, sorted by name.
pub async fn list_files(dir: &Path) -> ApiResult<Vec<PathBuf>> {
    let read_error =
        |e: std::io::Error| ApiError::internal_error(format!("Failed to read {}: {}", dir.display(), e));

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_error)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
        if entry.file_type().await.map_err(read_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Publish every file in `dir` as one message on `subject`.
///
/// An unreadable file stops the run; a failed publish is logged and the
/// next file is tried.
pub async fn publish_dir(
    client: &async_nats::Client,
    subject: &str,
    dir: &Path,
) -> ApiResult<PublishReport> {
    let mut report = PublishReport::default();

    for path in list_files(dir).await? {
        let body = tokio::fs::read(&path).await.map_err(|e| {
            ApiError::internal_error(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match client.publish(subject.to_string(), Bytes::from(body)).await {
            Ok(()) => {
                tracing::info!(file = %path.display(), "Published");
                report.published += 1;
            }
            Err(e) => {
                tracing::error!(file = %path.display(), error = %e, "Publish failed");
                report.failed += 1;
            }
        }
    }

    client
        .flush()
        .await
        .map_err(|e| ApiError::bus_error(format!("Failed to flush: {}", e)))?;
    Ok(report)
}
