use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{RawQuery, State};
use bytes::Bytes;
use pointdata_cache::MemoryCache;
use pointdata_core::{Core, CoreState, IngestReply, ingest, ingest_handler};
use pointdata_storage::{EventStore, MemoryEventStore, PointdataRecord, StorageError, StorageResult};

struct Harness {
    cache: Arc<MemoryCache>,
    store: Arc<MemoryEventStore>,
    state: Arc<CoreState>,
}

fn harness() -> Harness {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(MemoryEventStore::new());
    let core = Core::new(cache.clone(), store.clone(), Duration::from_secs(5));
    Harness {
        cache,
        store,
        state: core.state(),
    }
}

const SERVER: Option<&str> = Some("server=web-01");

#[tokio::test]
async fn batch_of_three_is_stored() {
    let h = harness();
    let body = br#"[
        {"timestamp": "1", "system": "vpn", "username": "a"},
        {"timestamp": "2", "system": "vpn", "username": "b"},
        {"timestamp": "3", "system": "vpn", "username": "c"}
    ]"#;
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    assert_eq!(h.store.len(), 3);
}

#[tokio::test]
async fn non_object_batch_entries_are_skipped() {
    let h = harness();
    let body = br#"["junk", {"timestamp": "1", "username": "a"}, {"timestamp": "2", "username": "b"}]"#;
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    assert_eq!(h.store.len(), 2);
}

#[tokio::test]
async fn single_object_is_stored() {
    let h = harness();
    let body = br#"{"timestamp": "1", "system": "ssh", "username": "Alice", "is_utc": 1, "tzinfo": "UTC"}"#;
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    let rows = h.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].username.as_deref(), Some("alice"));
    assert_eq!(rows[0].is_utc, 1);
    assert_eq!(rows[0].tzinfo.as_deref(), Some("UTC"));
}

#[tokio::test]
async fn repeated_submission_is_deduplicated() {
    let h = harness();
    let body = br#"{"timestamp": "1", "system": "ssh", "username": "alice", "remote_ip": "10.0.0.5:4444"}"#;
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    assert_eq!(h.store.len(), 1);
    assert_eq!(h.cache.list("ip-resolve-queue"), vec!["10.0.0.5"]);
}

#[tokio::test]
async fn duplicates_inside_one_batch_collapse() {
    let h = harness();
    let body = br#"[
        {"timestamp": "1", "username": "a", "is_utc": true},
        {"timestamp": "1", "username": "a", "is_utc": false, "tzinfo": "EET"}
    ]"#;
    assert_eq!(ingest(&h.state, SERVER, body).await, IngestReply::Ok);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn broken_json_is_invalid_input() {
    let h = harness();
    assert_eq!(
        ingest(&h.state, SERVER, b"not json{").await,
        IngestReply::InvalidInput
    );
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn scalar_body_is_invalid_data_type() {
    let h = harness();
    assert_eq!(
        ingest(&h.state, SERVER, b"42").await,
        IngestReply::InvalidDataType
    );
    assert!(h.store.is_empty());
}

#[tokio::test]
async fn missing_server_touches_nothing() {
    let h = harness();
    let body = br#"{"timestamp": "1", "username": "a"}"#;
    assert_eq!(ingest(&h.state, None, body).await, IngestReply::InvalidHostname);
    assert_eq!(
        ingest(&h.state, Some("host=web-01"), body).await,
        IngestReply::InvalidHostname
    );
    assert_eq!(
        ingest(&h.state, Some("server=bad_host"), body).await,
        IngestReply::InvalidHostname
    );
    assert!(h.store.is_empty());
    assert_eq!(h.cache.operations(), 0);
}

#[tokio::test]
async fn later_invalid_server_keeps_earlier_valid_one() {
    let h = harness();
    let body = br#"{"timestamp": "1", "username": "a"}"#;
    assert_eq!(
        ingest(&h.state, Some("server=web-01&server=bad_host"), body).await,
        IngestReply::Ok
    );
    assert_eq!(h.store.len(), 1);
    assert_eq!(
        ingest(&h.state, Some("server=web%2D01"), body).await,
        IngestReply::InvalidHostname
    );
}

#[tokio::test]
async fn hostname_is_checked_before_body() {
    let h = harness();
    assert_eq!(
        ingest(&h.state, None, b"not json{").await,
        IngestReply::InvalidHostname
    );
}

/// Rejects every event whose username is `poison`.
struct PoisonStore {
    inner: MemoryEventStore,
    rejected: AtomicUsize,
}

#[async_trait]
impl EventStore for PoisonStore {
    async fn insert_event(&self, record: &PointdataRecord) -> StorageResult<()> {
        if record.username.as_deref() == Some("poison") {
            self.rejected.fetch_add(1, Ordering::SeqCst);
            return Err(StorageError::Unavailable("constraint violated".to_string()));
        }
        self.inner.insert_event(record).await
    }
}

#[tokio::test]
async fn failing_event_does_not_block_siblings() {
    let cache = Arc::new(MemoryCache::new());
    let store = Arc::new(PoisonStore {
        inner: MemoryEventStore::new(),
        rejected: AtomicUsize::new(0),
    });
    let core = Core::new(cache.clone(), store.clone(), Duration::from_secs(5));
    let body = br#"[
        {"timestamp": "1", "username": "a"},
        {"timestamp": "2", "username": "poison"},
        {"timestamp": "3", "username": "c"}
    ]"#;

    assert_eq!(ingest(&core.state(), SERVER, body).await, IngestReply::Ok);
    assert_eq!(store.inner.len(), 2);
    assert_eq!(store.rejected.load(Ordering::SeqCst), 1);
    assert!(!cache.contains("pointdata-2-None-poison-None-None-None"));
    assert!(cache.contains("pointdata-1-None-a-None-None-None"));
}

#[tokio::test]
async fn axum_handler_replies_with_plain_text() {
    let h = harness();
    let reply = ingest_handler(
        State(h.state.clone()),
        RawQuery(Some("server=web-01".to_string())),
        Bytes::from_static(br#"{"timestamp": "1", "username": "a"}"#),
    )
    .await;
    assert_eq!(reply, IngestReply::Ok);
    assert_eq!(h.store.len(), 1);
}
