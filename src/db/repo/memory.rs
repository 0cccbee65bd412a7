use super::{EntityStore, Record, StoreError};
use crate::domain::EntityKind;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// In-process entity store. A batch is applied under a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<(EntityKind, String), Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records of one kind.
    pub fn count(&self, kind: EntityKind) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .filter(|(k, _)| *k == kind)
            .count()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load(&self, kind: EntityKind, id: &str) -> Result<Option<Record>, StoreError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&(kind, id.to_string())).cloned())
    }

    async fn save_all(&self, records: Vec<Record>) -> Result<(), StoreError> {
        let mut stored = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        for record in records {
            stored.insert((record.kind(), record.id()), record);
        }
        Ok(())
    }
}
