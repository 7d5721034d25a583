use std::sync::RwLock;

use async_trait::async_trait;
use docket_proto::{EventId, EventRecord};

use crate::error::StoreError;

/// Durable home of event records.
///
/// `list` returns records in the order they were first inserted. Replacing a record with `put`
/// keeps its position.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, record: EventRecord) -> Result<(), StoreError>;

    async fn get(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError>;

    /// Replace an existing record. Returns false if there was nothing to replace.
    async fn put(&self, record: EventRecord) -> Result<bool, StoreError>;

    async fn remove(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError>;

    async fn list(&self) -> Result<Vec<EventRecord>, StoreError>;
}

/// Keeps everything in memory. Records are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    records: RwLock<Vec<EventRecord>>,
}

impl MemoryEventStore {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn insert(&self, record: EventRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().expect("Failed to lock records");
        if records.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Duplicate(record.id));
        }
        records.push(record);
        Ok(())
    }

    async fn get(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        Ok(self.records.read().expect("Failed to lock records").iter().find(|r| &r.id == id).cloned())
    }

    async fn put(&self, record: EventRecord) -> Result<bool, StoreError> {
        let mut records = self.records.write().expect("Failed to lock records");
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                *existing = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let mut records = self.records.write().expect("Failed to lock records");
        Ok(records.iter().position(|r| &r.id == id).map(|index| records.remove(index)))
    }

    async fn list(&self) -> Result<Vec<EventRecord>, StoreError> { Ok(self.records.read().expect("Failed to lock records").clone()) }
}
