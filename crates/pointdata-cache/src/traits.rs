use async_trait::async_trait;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Shared key-value cache. Each call maps onto one atomic backend primitive;
/// callers must not assume atomicity across calls.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn exists(&self, key: &str) -> CacheResult<bool>;
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;
    /// Set without expiry.
    async fn set(&self, key: &str, value: &str) -> CacheResult<()>;
    /// Append to the tail of a list (RPUSH).
    async fn push(&self, queue: &str, value: &str) -> CacheResult<()>;
}
