//! Redis cache backend.
//!
//! Plain string keys and lists only: `EXISTS`, `GET`, `SET` (no expiry) and
//! `RPUSH`. Keys are not prefixed because other services read them.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use tracing::info;

use crate::traits::{Cache, CacheResult};

#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to `redis://host:port/db`. The manager reconnects on its own
    /// after transient failures.
    pub async fn connect(url: &str) -> CacheResult<Self> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        info!(event = "cache_connected", backend = "redis");
        Ok(Self { connection })
    }

    /// Clone of the multiplexed connection; cheap.
    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn();
        let found: bool = conn.exists(key).await?;
        Ok(found)
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.conn();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn push(&self, queue: &str, value: &str) -> CacheResult<()> {
        let mut conn = self.conn();
        let _: i64 = conn.rpush(queue, value).await?;
        Ok(())
    }
}
