use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex,
};

use chrono::{DateTime, NaiveDate, Utc};
use docket_proto::{CreateEvent, EditEvent, EventId, EventRecord, TempId};
use docket_signals::{Mut, Read};
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::{query::QueryKey, util::SafeMap};

/// Identity of a row in a cached list: the server's id once confirmed, a local stand-in before that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "camelCase")]
pub enum RecordKey {
    Server(EventId),
    Temporary(TempId),
}

impl std::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKey::Server(id) => write!(f, "{id}"),
            RecordKey::Temporary(id) => write!(f, "{id}"),
        }
    }
}

/// One row of a cached list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEvent {
    pub key: RecordKey,
    pub title: String,
    pub body: String,
    pub event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Set while a mutation cycle is pending on this row
    pub speculative: bool,
}

impl CachedEvent {
    /// A row standing in for a record the server has not created yet. The timestamps are placeholders.
    pub(crate) fn speculative_create(temp_id: TempId, input: &CreateEvent, now: DateTime<Utc>) -> Self {
        Self {
            key: RecordKey::Temporary(temp_id),
            title: input.title.clone(),
            body: input.body.clone(),
            event_date: input.event_date,
            created_at: now,
            updated_at: now,
            speculative: true,
        }
    }

    pub(crate) fn apply_edit(&mut self, input: &EditEvent) {
        self.title = input.title.clone();
        self.body = input.body.clone();
        self.event_date = input.event_date;
        self.speculative = true;
    }

    pub fn server_id(&self) -> Option<&EventId> {
        match &self.key {
            RecordKey::Server(id) => Some(id),
            RecordKey::Temporary(_) => None,
        }
    }

    pub fn temp_id(&self) -> Option<TempId> {
        match &self.key {
            RecordKey::Temporary(id) => Some(*id),
            RecordKey::Server(_) => None,
        }
    }

    /// The confirmed record behind this row, if it is confirmed.
    pub fn to_record(&self) -> Option<EventRecord> {
        if self.speculative {
            return None;
        }
        Some(EventRecord {
            id: self.server_id()?.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            event_date: self.event_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl From<EventRecord> for CachedEvent {
    fn from(record: EventRecord) -> Self {
        Self {
            key: RecordKey::Server(record.id),
            title: record.title,
            body: record.body,
            event_date: record.event_date,
            created_at: record.created_at,
            updated_at: record.updated_at,
            speculative: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntryStatus {
    /// Never fetched
    Unloaded,
    /// Matches the last list the server returned, plus any committed mutations since
    Fresh,
    /// A mutation committed since the last fetch; a refetch is due
    Stale,
}

/// The cached list under one query key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub key: QueryKey,
    pub records: Vec<CachedEvent>,
    pub status: EntryStatus,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    pub fn unloaded(key: QueryKey) -> Self { Self { key, records: Vec::new(), status: EntryStatus::Unloaded, fetched_at: None } }

    pub(crate) fn fetched(key: QueryKey, records: Vec<EventRecord>, at: DateTime<Utc>) -> Self {
        Self { key, records: records.into_iter().map(CachedEvent::from).collect(), status: EntryStatus::Fresh, fetched_at: Some(at) }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn position(&self, key: &RecordKey) -> Option<usize> { self.records.iter().position(|r| &r.key == key) }

    pub fn get(&self, key: &RecordKey) -> Option<&CachedEvent> { self.records.iter().find(|r| &r.key == key) }

    pub fn by_id(&self, id: &EventId) -> Option<&CachedEvent> { self.records.iter().find(|r| r.server_id() == Some(id)) }

    pub fn has_speculative(&self) -> bool { self.records.iter().any(|r| r.speculative) }

    pub fn titles(&self) -> Vec<&str> { self.records.iter().map(|r| r.title.as_str()).collect() }
}

/// Issued when a fetch starts. The result may only be written if no cancellation happened in between.
#[derive(Debug, Clone)]
pub(crate) struct FetchTicket {
    key: QueryKey,
    epoch: u64,
}

struct Slot {
    entry: Mut<CacheEntry>,
    fetch_epoch: AtomicU64,
    /// Set from the speculative write until the cycle has settled
    cycle_open: AtomicBool,
    refetch: Mutex<Option<AbortHandle>>,
}

/// Every cached list, by query key.
///
/// Anyone holding the store can read entries and subscribe to them; only the reconciler in this
/// crate can change them.
#[derive(Clone, Default)]
pub struct CacheStore(Arc<SafeMap<QueryKey, Arc<Slot>>>);

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("CacheStore").field("keys", &self.0.keys()).finish() }
}

impl CacheStore {
    pub fn new() -> Self { Self::default() }

    fn slot(&self, key: &QueryKey) -> Arc<Slot> {
        self.0.get_or_insert_with(key.clone(), || {
            Arc::new(Slot {
                entry: Mut::new(CacheEntry::unloaded(key.clone())),
                fetch_epoch: AtomicU64::new(0),
                cycle_open: AtomicBool::new(false),
                refetch: Mutex::new(None),
            })
        })
    }

    /// The present value of the list under `key` (an unloaded, empty entry if nothing is cached yet).
    pub fn entry(&self, key: &QueryKey) -> Arc<CacheEntry> { self.slot(key).entry.peek() }

    /// A live handle onto the list under `key`.
    pub fn read(&self, key: &QueryKey) -> Read<CacheEntry> { self.slot(key).entry.read() }

    pub fn keys(&self) -> Vec<QueryKey> { self.0.keys() }

    /// Replace the entry with `f(current)` and return the entry that was replaced.
    pub(crate) fn update(&self, key: &QueryKey, f: impl FnOnce(&CacheEntry) -> CacheEntry) -> Arc<CacheEntry> {
        self.slot(key).entry.update(f)
    }

    /// Put back an entry exactly as it was.
    pub(crate) fn restore(&self, key: &QueryKey, snapshot: Arc<CacheEntry>) { self.slot(key).entry.set_arc(snapshot) }

    pub(crate) fn mark_stale(&self, key: &QueryKey) -> bool {
        self.slot(key).entry.try_update(|entry| match entry.status {
            EntryStatus::Fresh => Some(CacheEntry { status: EntryStatus::Stale, ..entry.clone() }),
            EntryStatus::Stale | EntryStatus::Unloaded => None,
        })
    }

    pub(crate) fn fetch_ticket(&self, key: &QueryKey) -> FetchTicket {
        FetchTicket { key: key.clone(), epoch: self.slot(key).fetch_epoch.load(Ordering::Acquire) }
    }

    /// Make every outstanding fetch for `key` irrelevant: abort the background refetch task if there
    /// is one, and advance the epoch so a result already on its way is discarded.
    /// Returns true if a background task was aborted.
    fn cancel_fetches(&self, key: &QueryKey) -> bool {
        let slot = self.slot(key);
        slot.fetch_epoch.fetch_add(1, Ordering::AcqRel);
        let task = slot.refetch.lock().expect("Failed to lock refetch handle").take();
        match task {
            Some(task) if !task.is_finished() => {
                task.abort();
                debug!("aborted background refetch of {key}");
                true
            }
            _ => false,
        }
    }

    /// Cancel outstanding fetches and refuse fetch results until [`CacheStore::close_cycle`].
    /// Must be called before the speculative write. Returns true if a background task was aborted.
    pub(crate) fn open_cycle(&self, key: &QueryKey) -> bool {
        self.slot(key).cycle_open.store(true, Ordering::Release);
        self.cancel_fetches(key)
    }

    /// Accept fetch results again, except from fetches issued while the cycle was open.
    pub(crate) fn close_cycle(&self, key: &QueryKey) {
        let slot = self.slot(key);
        slot.fetch_epoch.fetch_add(1, Ordering::AcqRel);
        slot.cycle_open.store(false, Ordering::Release);
    }

    /// Write a fetched list, unless the fetch was cancelled after `ticket` was issued or a mutation
    /// cycle is open on the key.
    pub(crate) fn complete_fetch(&self, ticket: FetchTicket, records: Vec<EventRecord>) -> bool {
        let slot = self.slot(&ticket.key);
        let now = Utc::now();
        slot.entry.try_update(|_| {
            // checked under the entry lock, so a cancellation cannot slip in between check and write
            if slot.cycle_open.load(Ordering::Acquire) || slot.fetch_epoch.load(Ordering::Acquire) != ticket.epoch {
                return None;
            }
            Some(CacheEntry::fetched(ticket.key.clone(), records, now))
        })
    }

    /// Remember the task refetching `key`, aborting any previous one.
    pub(crate) fn set_refetch_task(&self, key: &QueryKey, task: AbortHandle) {
        let slot = self.slot(key);
        if let Some(previous) = slot.refetch.lock().expect("Failed to lock refetch handle").replace(task) {
            previous.abort();
        };
    }
}
