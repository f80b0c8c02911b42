use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use crate::traits::{Cache, CacheResult};

/// In-process cache with the same semantics as the Redis backend.
#[derive(Default)]
pub struct MemoryCache {
    values: DashMap<String, String>,
    lists: DashMap<String, Vec<String>>,
    operations: AtomicUsize,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as an operation.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Snapshot of a list, head first.
    pub fn list(&self, queue: &str) -> Vec<String> {
        self.lists
            .get(queue)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of trait calls served so far.
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::Relaxed)
    }

    fn touch(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.touch();
        Ok(self.values.contains_key(key) || self.lists.contains_key(key))
    }

    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.touch();
        Ok(self.values.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: &str) -> CacheResult<()> {
        self.touch();
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn push(&self, queue: &str, value: &str) -> CacheResult<()> {
        self.touch();
        self.lists
            .entry(queue.to_string())
            .or_default()
            .push(value.to_string());
        Ok(())
    }
}
