use std::time::Duration;

use pointdata_cache::CacheError;
use pointdata_storage::StorageError;

/// Per-event failure. Never reaches the HTTP response; the handler logs and
/// counts it, then moves on to the next event.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("store write failed: {0}")]
    Store(#[from] StorageError),
    #[error("cache call failed: {0}")]
    Cache(#[from] CacheError),
    #[error("event processing exceeded {0:?}")]
    Timeout(Duration),
}

impl IngestError {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Store(_) => "store_error",
            IngestError::Cache(_) => "cache_error",
            IngestError::Timeout(_) => "timeout",
        }
    }
}
