use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use docket_proto::{EventId, EventRecord};
use serde::{Deserialize, Serialize};
use sled::{Config, Db, Tree};

use crate::{error::StoreError, store::EventStore};

/// Event records in a sled database.
///
/// `events` maps an insertion sequence number to the encoded record, so iterating the tree yields
/// insertion order. `event_index` maps the event id to that sequence number.
pub struct SledEventStore {
    db: Db,
    events: Tree,
    index: Tree,
}

/// The stored form of a record. Every field is always written, as bincode can't skip fields.
#[derive(Serialize, Deserialize)]
struct StoredEvent {
    id: EventId,
    title: String,
    body: String,
    event_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRecord> for StoredEvent {
    fn from(r: EventRecord) -> Self {
        Self { id: r.id, title: r.title, body: r.body, event_date: r.event_date, created_at: r.created_at, updated_at: r.updated_at }
    }
}

impl From<StoredEvent> for EventRecord {
    fn from(s: StoredEvent) -> Self {
        Self { id: s.id, title: s.title, body: s.body, event_date: s.event_date, created_at: s.created_at, updated_at: s.updated_at }
    }
}

impl SledEventStore {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path.as_ref())?;
        let db = sled::open(path.as_ref().join("sled"))?;
        Ok(Self::with_db(db)?)
    }

    /// A store that is deleted when dropped.
    pub fn new_test() -> anyhow::Result<Self> {
        let db = Config::new().temporary(true).flush_every_ms(None).open()?;
        Ok(Self::with_db(db)?)
    }

    fn with_db(db: Db) -> Result<Self, StoreError> {
        let events = db.open_tree("events")?; // sequence -> record
        let index = db.open_tree("event_index")?; // id -> sequence
        Ok(Self { db, events, index })
    }

    pub async fn flush(&self) -> Result<(), StoreError> {
        self.db.flush_async().await?;
        Ok(())
    }

    fn sequence_of(&self, id: &EventId) -> Result<Option<sled::IVec>, StoreError> { Ok(self.index.get(id.as_str())?) }

    fn decode(bytes: &[u8]) -> Result<EventRecord, StoreError> { Ok(bincode::deserialize::<StoredEvent>(bytes)?.into()) }

    fn encode(record: EventRecord) -> Result<Vec<u8>, StoreError> { Ok(bincode::serialize(&StoredEvent::from(record))?) }
}

#[async_trait]
impl EventStore for SledEventStore {
    async fn insert(&self, record: EventRecord) -> Result<(), StoreError> {
        if self.index.contains_key(record.id.as_str())? {
            return Err(StoreError::Duplicate(record.id));
        }
        let sequence = self.db.generate_id()?.to_be_bytes();
        let id = record.id.clone();
        self.events.insert(sequence, Self::encode(record)?)?;
        self.index.insert(id.as_str(), &sequence[..])?;
        Ok(())
    }

    async fn get(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let Some(sequence) = self.sequence_of(id)? else { return Ok(None) };
        match self.events.get(&sequence)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Err(StoreError::CorruptIndex(id.to_string())),
        }
    }

    async fn put(&self, record: EventRecord) -> Result<bool, StoreError> {
        let Some(sequence) = self.sequence_of(&record.id)? else { return Ok(false) };
        self.events.insert(sequence, Self::encode(record)?)?;
        Ok(true)
    }

    async fn remove(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let Some(sequence) = self.index.remove(id.as_str())? else { return Ok(None) };
        match self.events.remove(&sequence)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Err(StoreError::CorruptIndex(id.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<EventRecord>, StoreError> {
        let mut records = Vec::new();
        for item in self.events.iter() {
            let (_, bytes) = item?;
            records.push(Self::decode(&bytes)?);
        }
        Ok(records)
    }
}

impl std::fmt::Debug for SledEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("SledEventStore").field("events", &self.events.len()).finish() }
}
