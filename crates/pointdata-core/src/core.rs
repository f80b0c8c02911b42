use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::any;
use pointdata_cache::Cache;
use pointdata_storage::EventStore;
use tower_http::trace::TraceLayer;

use crate::handler::ingest_handler;

/// Handles shared by every request. Both are pooled/multiplexed, so a
/// per-request session only clones the `Arc`s.
pub struct CoreState {
    pub cache: Arc<dyn Cache>,
    pub store: Arc<dyn EventStore>,
    pub event_timeout: Duration,
}

pub struct Core {
    state: Arc<CoreState>,
}

impl Core {
    pub fn new(cache: Arc<dyn Cache>, store: Arc<dyn EventStore>, event_timeout: Duration) -> Self {
        Self {
            state: Arc::new(CoreState {
                cache,
                store,
                event_timeout,
            }),
        }
    }

    /// Any method is accepted on both paths.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(ingest_handler))
            .route("/pointdata/update", any(ingest_handler))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
    }

    pub fn state(&self) -> Arc<CoreState> {
        self.state.clone()
    }
}
