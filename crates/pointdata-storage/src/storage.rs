use async_trait::async_trait;
use time::OffsetDateTime;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("db error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A normalized event ready to be written. Absent optional fields are `None`
/// and end up as SQL NULL, never as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointdataRecord {
    pub timestamp: Option<String>,
    pub received_at: OffsetDateTime,
    pub system: Option<String>,
    pub username: Option<String>,
    pub remote_ip: Option<String>,
    pub server_ip: Option<String>,
    pub data: Option<String>,
    pub tzinfo: Option<String>,
    pub is_utc: i16,
}

/// Durable event store. Append-only: there is no update or delete path.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, record: &PointdataRecord) -> StorageResult<()>;
}
