use std::sync::Arc;
use std::time::{Duration, Instant};

use pointdata_cache::Cache;
use pointdata_storage::{EventStore, PointdataRecord};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::error::IngestError;
use crate::event::{IP_RESOLVE_QUEUE, RawEvent, alias_key, strip_port, value_text};
use crate::metrics;

/// Value written under a dedup key. Only its presence matters.
const DEDUP_MARKER: &str = "True";

/// Resolved aliases this short or shorter are ignored.
const MIN_ALIAS_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Duplicate,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::Duplicate => "duplicate",
        }
    }
}

/// Per-request ingest context: the validated `server` hostname plus shared
/// handles to the cache and the store.
///
/// The hostname is carried for log/metric tagging only. It does not partition
/// storage or cache keys.
pub struct IngestSession {
    server: String,
    cache: Arc<dyn Cache>,
    store: Arc<dyn EventStore>,
    event_timeout: Duration,
}

impl IngestSession {
    pub fn new(
        server: impl Into<String>,
        cache: Arc<dyn Cache>,
        store: Arc<dyn EventStore>,
        event_timeout: Duration,
    ) -> Self {
        Self {
            server: server.into(),
            cache,
            store,
            event_timeout,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// Run one event through dedup, normalization, store write and queueing,
    /// bounded by the session's per-event timeout.
    ///
    /// The dedup check and the dedup mark are two separate cache calls, so two
    /// concurrent identical submissions can both be stored. The mark is only
    /// written after the row is durable: a failed or timed-out store write
    /// leaves the fingerprint unmarked and the event can be retried.
    pub async fn process(&self, event: RawEvent) -> Result<Outcome, IngestError> {
        let started_at = Instant::now();
        let result = match tokio::time::timeout(self.event_timeout, self.process_inner(event)).await
        {
            Ok(result) => result,
            Err(_) => Err(IngestError::Timeout(self.event_timeout)),
        };
        metrics::record_event_latency(started_at.elapsed());
        match &result {
            Ok(outcome) => metrics::record_event(outcome.label()),
            Err(err) => metrics::record_event(err.kind()),
        }
        result
    }

    async fn process_inner(&self, event: RawEvent) -> Result<Outcome, IngestError> {
        let fingerprint = event.fingerprint();
        if self.cache.exists(&fingerprint).await? {
            debug!(
                event = "pointdata_duplicate",
                server = %self.server,
                fingerprint = %fingerprint
            );
            return Ok(Outcome::Duplicate);
        }

        let is_utc = event.is_utc_flag();
        let received_at = OffsetDateTime::now_utc();
        let username = match event.username.as_ref() {
            Some(value) => Some(self.resolve_username(value_text(value).to_lowercase()).await?),
            None => None,
        };

        let remote_ip = event.remote_ip.as_ref().map(value_text);
        let server_ip = event.server_ip.as_ref().map(value_text);
        let record = PointdataRecord {
            timestamp: event.timestamp.as_ref().map(value_text),
            received_at,
            system: event.system.as_ref().map(value_text),
            username,
            remote_ip: remote_ip.clone(),
            server_ip: server_ip.clone(),
            data: event.data.as_ref().map(value_text),
            tzinfo: event.tzinfo.as_ref().map(value_text),
            is_utc,
        };
        self.store.insert_event(&record).await?;
        self.cache.set(&fingerprint, DEDUP_MARKER).await?;

        for address in [remote_ip, server_ip].into_iter().flatten() {
            self.cache
                .push(IP_RESOLVE_QUEUE, strip_port(&address))
                .await?;
            metrics::record_ip_enqueued();
        }

        debug!(
            event = "pointdata_accepted",
            server = %self.server,
            username = ?record.username,
            system = ?record.system
        );
        Ok(Outcome::Accepted)
    }

    /// Email-shaped usernames may map to a canonical account name.
    async fn resolve_username(&self, username: String) -> Result<String, IngestError> {
        if !username.contains('@') {
            return Ok(username);
        }
        match self.cache.get(&alias_key(&username)).await? {
            Some(alias) if alias.len() > MIN_ALIAS_LEN => {
                metrics::record_alias_resolved();
                Ok(alias)
            }
            Some(alias) => {
                warn!(
                    event = "alias_ignored",
                    server = %self.server,
                    username = %username,
                    alias = %alias
                );
                Ok(username)
            }
            None => Ok(username),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pointdata_cache::MemoryCache;
    use pointdata_storage::{MemoryEventStore, StorageError, StorageResult};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn raw(value: Value) -> RawEvent {
        RawEvent::from(value.as_object().unwrap())
    }

    fn session(cache: &Arc<MemoryCache>, store: Arc<dyn EventStore>) -> IngestSession {
        IngestSession::new("web-01", cache.clone(), store, Duration::from_secs(5))
    }

    /// Fails the first `failures` inserts, then delegates.
    struct FlakyStore {
        failures: AtomicUsize,
        inner: MemoryEventStore,
    }

    #[async_trait]
    impl EventStore for FlakyStore {
        async fn insert_event(&self, record: &PointdataRecord) -> StorageResult<()> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StorageError::Unavailable("db down".to_string()));
            }
            self.inner.insert_event(record).await
        }
    }

    struct StalledStore;

    #[async_trait]
    impl EventStore for StalledStore {
        async fn insert_event(&self, _record: &PointdataRecord) -> StorageResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn identical_event_is_stored_once() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());
        let event = json!({"timestamp": "t1", "system": "vpn", "username": "alice", "data": "login"});

        assert_eq!(session.process(raw(event.clone())).await.unwrap(), Outcome::Accepted);
        assert_eq!(session.process(raw(event)).await.unwrap(), Outcome::Duplicate);
        assert_eq!(store.len(), 1);
        assert!(cache.contains("pointdata-t1-vpn-alice-login-None-None"));
    }

    #[tokio::test]
    async fn timezone_fields_do_not_split_identity() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        let first = json!({"timestamp": "t1", "system": "vpn", "username": "alice", "is_utc": true, "tzinfo": "UTC"});
        let second = json!({"timestamp": "t1", "system": "vpn", "username": "alice", "is_utc": false, "tzinfo": "Europe/Helsinki"});
        assert_eq!(session.process(raw(first)).await.unwrap(), Outcome::Accepted);
        assert_eq!(session.process(raw(second)).await.unwrap(), Outcome::Duplicate);

        let rows = store.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].is_utc, 1);
        assert_eq!(rows[0].tzinfo.as_deref(), Some("UTC"));
    }

    #[tokio::test]
    async fn email_username_resolves_through_alias() {
        let cache = Arc::new(MemoryCache::new());
        cache.insert("email-to-username-foo@example.com", "foo123");
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session
            .process(raw(json!({"timestamp": "t", "system": "s", "username": "Foo@Example.com"})))
            .await
            .unwrap();
        assert_eq!(store.rows()[0].username.as_deref(), Some("foo123"));
    }

    #[tokio::test]
    async fn email_username_without_alias_is_lowercased() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session
            .process(raw(json!({"timestamp": "t", "system": "s", "username": "Foo@Example.com"})))
            .await
            .unwrap();
        assert_eq!(store.rows()[0].username.as_deref(), Some("foo@example.com"));
        // Fingerprint keeps the caller's casing.
        assert!(cache.contains("pointdata-t-s-Foo@Example.com-None-None-None"));
    }

    #[tokio::test]
    async fn short_alias_is_ignored() {
        let cache = Arc::new(MemoryCache::new());
        cache.insert("email-to-username-bar@example.com", "bar");
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session
            .process(raw(json!({"username": "bar@example.com"})))
            .await
            .unwrap();
        assert_eq!(store.rows()[0].username.as_deref(), Some("bar@example.com"));
    }

    #[tokio::test]
    async fn plain_username_skips_alias_lookup() {
        let cache = Arc::new(MemoryCache::new());
        cache.insert("email-to-username-carol", "somebody");
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session.process(raw(json!({"username": "CAROL"}))).await.unwrap();
        assert_eq!(store.rows()[0].username.as_deref(), Some("carol"));
    }

    #[tokio::test]
    async fn ip_addresses_are_queued_without_port() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session
            .process(raw(json!({
                "timestamp": "t",
                "username": "u",
                "remote_ip": "10.0.0.5:4444",
                "server_ip": "192.168.1.1"
            })))
            .await
            .unwrap();
        assert_eq!(cache.list("ip-resolve-queue"), vec!["10.0.0.5", "192.168.1.1"]);
        // The row keeps the address as sent.
        assert_eq!(store.rows()[0].remote_ip.as_deref(), Some("10.0.0.5:4444"));
    }

    #[tokio::test]
    async fn absent_fields_are_stored_as_null() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryEventStore::new());
        let session = session(&cache, store.clone());

        session.process(raw(json!({"data": null}))).await.unwrap();
        let row = &store.rows()[0];
        assert_eq!(row.timestamp, None);
        assert_eq!(row.system, None);
        assert_eq!(row.username, None);
        assert_eq!(row.data, None);
        assert_eq!(row.remote_ip, None);
        assert_eq!(row.server_ip, None);
        assert_eq!(row.tzinfo, None);
        assert_eq!(row.is_utc, 0);
        assert!(cache.list("ip-resolve-queue").is_empty());
    }

    #[tokio::test]
    async fn store_failure_leaves_event_retryable() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(FlakyStore {
            failures: AtomicUsize::new(1),
            inner: MemoryEventStore::new(),
        });
        let session = session(&cache, store.clone());
        let event = json!({"timestamp": "t", "system": "s", "username": "u", "remote_ip": "1.2.3.4"});

        let err = session.process(raw(event.clone())).await.unwrap_err();
        assert!(matches!(err, IngestError::Store(_)));
        assert!(!cache.contains("pointdata-t-s-u-None-1.2.3.4-None"));
        assert!(cache.list("ip-resolve-queue").is_empty());

        assert_eq!(session.process(raw(event)).await.unwrap(), Outcome::Accepted);
        assert_eq!(store.inner.len(), 1);
        assert!(cache.contains("pointdata-t-s-u-None-1.2.3.4-None"));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_times_out_without_marking() {
        let cache = Arc::new(MemoryCache::new());
        let session = IngestSession::new(
            "web-01",
            cache.clone(),
            Arc::new(StalledStore),
            Duration::from_millis(100),
        );

        let err = session
            .process(raw(json!({"timestamp": "t", "system": "s", "username": "u"})))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::Timeout(_)));
        assert!(!cache.contains("pointdata-t-s-u-None-None-None"));
    }
}
