//! Consumer and publisher tests that need no running NATS server.

use std::path::PathBuf;

use bytes::Bytes;
use futures_util::stream;
use orderline_api::{bus, Components};
use orderline_core::validate_order;
use orderline_storage::{CacheBackend, InMemoryRecordStore, RecordStore};
use orderline_test_utils::fixtures;

fn message(body: impl Into<Bytes>) -> Bytes {
    body.into()
}

#[tokio::test]
async fn test_drain_processes_stream_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let components = Components::new(InMemoryRecordStore::new());
    let pipeline = components.pipeline();

    let messages = vec![
        message(fixtures::minimal_message("A")),
        message(r#"{"order_uid": "A", "locale": "ru"}"#),
        message("not json at all"),
        message(r#"{"order_uid": ""}"#),
        message(fixtures::sample_order_message()),
    ];

    let seen = bus::drain(&pipeline, stream::iter(messages)).await;

    assert_eq!(seen, 5);
    assert_eq!(components.cached_orders(), 2);

    // Last write for "A" wins in both the cache and the store.
    let expected = validate_order(br#"{"order_uid": "A", "locale": "ru"}"#)?.payload;
    assert_eq!(components.cache.read("A"), Some(expected.clone()));
    assert_eq!(components.store.query_one("A").await?, Some(expected));
    Ok(())
}

#[tokio::test]
async fn test_drain_continues_after_persistence_failure() {
    let store = InMemoryRecordStore::new();
    store.set_reject_writes(true);
    let components = Components::new(store);
    let pipeline = components.pipeline();

    let messages = vec![
        message(fixtures::minimal_message("A")),
        message(fixtures::minimal_message("B")),
    ];
    let seen = bus::drain(&pipeline, stream::iter(messages)).await;

    assert_eq!(seen, 2);
    assert!(components.cache.is_empty());
}

#[tokio::test]
async fn test_warm_start_then_drain() -> Result<(), Box<dyn std::error::Error>> {
    let store = InMemoryRecordStore::with_records([fixtures::minimal_record("old")?]);
    store.put_undecodable("broken")?;
    let components = Components::new(store);

    let report = components
        .warm_start(Default::default())
        .load()
        .await?;
    assert_eq!((report.loaded, report.skipped), (1, 1));

    bus::drain(
        &components.pipeline(),
        stream::iter(vec![message(fixtures::minimal_message("new"))]),
    )
    .await;

    assert!(components.cache.read("old").is_some());
    assert!(components.cache.read("new").is_some());
    Ok(())
}

fn scratch_dir(name: &str) -> std::io::Result<PathBuf> {
    let dir = std::env::temp_dir().join(format!("orderline-{}-{}", name, std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir)?;
    }
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[tokio::test]
async fn test_list_files_sorted_and_skips_directories() -> Result<(), Box<dyn std::error::Error>> {
    let dir = scratch_dir("list")?;
    std::fs::write(dir.join("b.json"), b"{}")?;
    std::fs::write(dir.join("a.json"), b"{}")?;
    std::fs::create_dir(dir.join("nested"))?;

    let files = bus::list_files(&dir).await?;

    assert_eq!(files, vec![dir.join("a.json"), dir.join("b.json")]);
    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

#[tokio::test]
async fn test_list_files_missing_dir_is_error() {
    let missing = std::env::temp_dir().join("orderline-definitely-missing-dir");

    assert!(bus::list_files(&missing).await.is_err());
}
