use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use docket_proto::{ActionResult, CreateEvent, DeleteEvent, EditEvent, EventFields, EventId, EventRecord, FieldErrors};
use tracing::{error, info};

use crate::{error::StoreError, store::EventStore};

pub const TITLE_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 10_000;

pub const CREATED: &str = "Event created successfully";
pub const UPDATED: &str = "Event updated successfully";
pub const DELETED: &str = "Event deleted successfully";
pub const NOT_FOUND: &str = "Event not found";
pub const INVALID: &str = "Invalid event data";
pub const INTERNAL: &str = "Something went wrong while saving the event";

/// The server side of every event mutation: validation, timestamps, and not-found detection.
///
/// Mutations are applied one at a time, so an edit's read-modify-write can't interleave with
/// another mutation.
#[derive(Clone)]
pub struct EventActions {
    store: Arc<dyn EventStore>,
    write: Arc<tokio::sync::Mutex<()>>,
}

impl EventActions {
    pub fn new(store: Arc<dyn EventStore>) -> Self { Self { store, write: Arc::new(tokio::sync::Mutex::new(())) } }

    pub async fn create(&self, input: CreateEvent) -> ActionResult<EventRecord> {
        if let Err(errors) = validate(&input) {
            return ActionResult::invalid(INVALID, errors);
        }
        let now = Utc::now();
        let record = EventRecord {
            id: EventId::generate(),
            title: input.title.trim().to_owned(),
            body: input.body.trim().to_owned(),
            event_date: input.event_date,
            created_at: now,
            updated_at: now,
        };

        let _write = self.write.lock().await;
        match self.store.insert(record.clone()).await {
            Ok(()) => {
                info!("created event {}", record.id);
                ActionResult::success(record, CREATED)
            }
            Err(e) => internal("create", e),
        }
    }

    pub async fn edit(&self, input: EditEvent) -> ActionResult<EventRecord> {
        if let Err(errors) = validate(&input) {
            return ActionResult::invalid(INVALID, errors);
        }

        let _write = self.write.lock().await;
        let existing = match self.store.get(&input.id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return ActionResult::not_found(NOT_FOUND),
            Err(e) => return internal("edit", e),
        };
        let record = EventRecord {
            title: input.title.trim().to_owned(),
            body: input.body.trim().to_owned(),
            event_date: input.event_date,
            updated_at: next_updated_at(existing.updated_at, Utc::now()),
            ..existing
        };
        match self.store.put(record.clone()).await {
            Ok(true) => {
                info!("updated event {}", record.id);
                ActionResult::success(record, UPDATED)
            }
            Ok(false) => ActionResult::not_found(NOT_FOUND),
            Err(e) => internal("edit", e),
        }
    }

    pub async fn delete(&self, input: DeleteEvent) -> ActionResult<()> {
        let _write = self.write.lock().await;
        match self.store.remove(&input.id).await {
            Ok(Some(_)) => {
                info!("deleted event {}", input.id);
                ActionResult::success((), DELETED)
            }
            Ok(None) => ActionResult::not_found(NOT_FOUND),
            Err(e) => internal("delete", e),
        }
    }

    pub async fn list(&self) -> Result<Vec<EventRecord>, StoreError> { self.store.list().await }
}

impl std::fmt::Debug for EventActions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("EventActions").finish_non_exhaustive() }
}

/// Presence plus length limits.
pub fn validate(input: &impl EventFields) -> Result<(), FieldErrors> {
    let mut errors = match input.check_presence() {
        Ok(()) => FieldErrors::new(),
        Err(errors) => errors,
    };
    if input.title().trim().chars().count() > TITLE_MAX_CHARS {
        errors.add("title", format!("Title must be at most {TITLE_MAX_CHARS} characters"));
    }
    if input.body().trim().chars().count() > BODY_MAX_CHARS {
        errors.add("body", format!("Body must be at most {BODY_MAX_CHARS} characters"));
    }
    errors.into_result()
}

/// `updatedAt` must move forward on every edit, even if the clock hasn't.
fn next_updated_at(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

fn internal<T>(action: &str, e: StoreError) -> ActionResult<T> {
    error!("{action} failed: {e}");
    ActionResult::internal(INTERNAL)
}
