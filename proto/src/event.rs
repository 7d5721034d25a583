use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{id::EventId, result::FieldErrors};

/// One calendar entry as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub body: String,
    /// `None` means the date is still to be announced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEvent {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditEvent {
    pub id: EventId,
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub id: EventId,
}

/// The user-editable part of an event, shared by create and edit payloads.
pub trait EventFields {
    fn title(&self) -> &str;
    fn body(&self) -> &str;
    fn event_date(&self) -> Option<NaiveDate>;

    /// Presence checks only: `title` and `body` must contain something other than whitespace.
    /// Anything stricter is the server's call.
    fn check_presence(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.title().trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.body().trim().is_empty() {
            errors.add("body", "Body is required");
        }
        errors.into_result()
    }
}

impl EventFields for CreateEvent {
    fn title(&self) -> &str { &self.title }
    fn body(&self) -> &str { &self.body }
    fn event_date(&self) -> Option<NaiveDate> { self.event_date }
}

impl EventFields for EditEvent {
    fn title(&self) -> &str { &self.title }
    fn body(&self) -> &str { &self.body }
    fn event_date(&self) -> Option<NaiveDate> { self.event_date }
}

impl EventFields for EventRecord {
    fn title(&self) -> &str { &self.title }
    fn body(&self) -> &str { &self.body }
    fn event_date(&self) -> Option<NaiveDate> { self.event_date }
}

impl CreateEvent {
    pub fn new(title: impl Into<String>, body: impl Into<String>, event_date: Option<NaiveDate>) -> Self {
        Self { title: title.into(), body: body.into(), event_date }
    }
}

impl EditEvent {
    pub fn new(id: EventId, title: impl Into<String>, body: impl Into<String>, event_date: Option<NaiveDate>) -> Self {
        Self { id, title: title.into(), body: body.into(), event_date }
    }
}

impl DeleteEvent {
    pub fn new(id: EventId) -> Self { Self { id } }
}
