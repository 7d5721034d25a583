use std::sync::Arc;

use chrono::NaiveDate;
use docket_proto::{CreateEvent, EditEvent, EventId, FieldErrors};
use docket_signals::{Read, SubscriptionGuard};
use serde::Serialize;

use crate::{
    cache::{CacheEntry, CachedEvent, EntryStatus, RecordKey},
    error::RetrievalError,
    query::QueryKey,
    reconciler::{MutationOutcome, Reconciler},
};

pub const DATE_TO_BE_ANNOUNCED: &str = "TBA";

/// One displayed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRow {
    pub key: RecordKey,
    pub title: String,
    pub body: String,
    pub date_label: String,
    /// The row reflects a change the server has not confirmed yet
    pub pending: bool,
}

impl From<&CachedEvent> for EventRow {
    fn from(event: &CachedEvent) -> Self {
        Self {
            key: event.key.clone(),
            title: event.title.clone(),
            body: event.body.clone(),
            date_label: date_label(event.event_date),
            pending: event.speculative,
        }
    }
}

pub fn date_label(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%B %-d, %Y").to_string(),
        None => DATE_TO_BE_ANNOUNCED.to_owned(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// What a form shows after a submission: a toast-style message, plus per-field errors on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    pub field_errors: Option<FieldErrors>,
}

impl Notice {
    pub fn is_error(&self) -> bool { self.level == NoticeLevel::Error }

    /// The messages to show next to `field`, if any.
    pub fn field(&self, field: &str) -> &[String] { self.field_errors.as_ref().map(|errors| errors.get(field)).unwrap_or(&[]) }
}

impl From<MutationOutcome> for Notice {
    fn from(outcome: MutationOutcome) -> Self {
        match outcome {
            MutationOutcome::Committed { message, .. } => Notice { level: NoticeLevel::Success, message, field_errors: None },
            MutationOutcome::Failed { failure, .. } => Notice { level: NoticeLevel::Error, message: failure.message, field_errors: failure.errors },
        }
    }
}

/// The list of events under one query key, as the user sees it.
///
/// Holds only a read handle on the cache. Every change goes through the reconciler's submit
/// methods, so the view never writes the cache itself.
#[derive(Clone)]
pub struct EventListView {
    key: QueryKey,
    cache: Read<CacheEntry>,
    reconciler: Reconciler,
}

impl EventListView {
    pub fn new(reconciler: &Reconciler, key: QueryKey) -> Self {
        Self { cache: reconciler.subscribe(&key), key, reconciler: reconciler.clone() }
    }

    pub fn key(&self) -> &QueryKey { &self.key }

    pub fn is_loading(&self) -> bool { self.cache.with(is_loading) }

    pub fn rows(&self) -> Vec<EventRow> { self.cache.with(rows) }

    pub fn render(&self) -> String { self.cache.with(render) }

    /// Call `f` with the new rows every time the list changes, until the guard is dropped.
    pub fn on_change<F>(&self, f: F) -> SubscriptionGuard
    where F: Fn(Vec<EventRow>) + Send + Sync + 'static {
        self.cache.subscribe(move |entry: Arc<CacheEntry>| f(rows(&entry)))
    }

    /// Initial load of the list.
    pub async fn load(&self) -> Result<(), RetrievalError> {
        self.reconciler.fetch(&self.key).await?;
        Ok(())
    }

    pub async fn submit_create(&self, title: impl Into<String>, body: impl Into<String>, event_date: Option<NaiveDate>) -> Notice {
        self.reconciler.create(&self.key, CreateEvent::new(title, body, event_date)).await.into()
    }

    pub async fn submit_edit(&self, id: EventId, title: impl Into<String>, body: impl Into<String>, event_date: Option<NaiveDate>) -> Notice {
        self.reconciler.edit(&self.key, EditEvent::new(id, title, body, event_date)).await.into()
    }

    pub async fn submit_delete(&self, id: EventId) -> Notice { self.reconciler.delete(&self.key, id).await.into() }
}

impl std::fmt::Debug for EventListView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("EventListView").field("key", &self.key).finish() }
}

fn rows(entry: &CacheEntry) -> Vec<EventRow> { entry.records.iter().map(EventRow::from).collect() }

/// Nothing to show until the first fetch, unless a mutation has already put rows in.
fn is_loading(entry: &CacheEntry) -> bool { entry.status == EntryStatus::Unloaded && entry.is_empty() }

fn render(entry: &CacheEntry) -> String {
    if is_loading(entry) {
        return "Loading events...\n".to_owned();
    }
    if entry.is_empty() {
        return "No events yet.\n".to_owned();
    }
    let mut out = String::new();
    for row in rows(entry) {
        let marker = if row.pending { " (saving)" } else { "" };
        out.push_str(&format!("{} | {}{}\n    {}\n", row.date_label, row.title, marker, row.body));
    }
    out
}
