use std::sync::Mutex;

use async_trait::async_trait;

use crate::storage::{EventStore, PointdataRecord, StorageError, StorageResult};

/// In-process store, used by tests and local dry runs.
#[derive(Default)]
pub struct MemoryEventStore {
    rows: Mutex<Vec<PointdataRecord>>,
}

impl MemoryEventStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every row written so far, in insertion order.
    pub fn rows(&self) -> Vec<PointdataRecord> {
        self.rows
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|guard| guard.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert_event(&self, record: &PointdataRecord) -> StorageResult<()> {
        let mut guard = self
            .rows
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))?;
        guard.push(record.clone());
        Ok(())
    }
}
