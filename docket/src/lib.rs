//! # Docket
//!
//! Docket keeps a client-side list of calendar events in step with a server, applying every
//! create, edit and delete to the list before the server has answered.
//!
//! ## Key Features
//!
//! - **Optimistic updates**: a submitted change is visible to subscribers immediately
//! - **Exact rollback**: a failed change restores the list exactly as it was before the submission
//! - **Serialized cycles**: mutations on one list run one at a time, in submission order
//! - **Observable cache**: lists and mutation phases are signals that views subscribe to
//!
//! ## Core Concepts
//!
//! - **CacheStore**: every cached list, by query key. Read by anyone, written only by the reconciler
//! - **Reconciler**: runs mutation cycles (Idle → Pending → Resolved → Idle) and fetches
//! - **EventsCollaborator**: the client's way of reaching the server
//! - **EventListView**: renders a list and turns form submissions into mutation cycles
//!
//! ## Example
//!
//! ```rust
//! # use docket::{CacheStore, EventListView, QueryKey, Reconciler, ReconcilerConfig};
//! # use docket_connector_local_process::LocalProcessConnection;
//! # use docket_server::{EventActions, MemoryEventStore};
//! # use std::sync::Arc;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Serve the event actions in-process
//!     let connection = LocalProcessConnection::new(EventActions::new(Arc::new(MemoryEventStore::new())));
//!
//!     let reconciler = Reconciler::new(CacheStore::new(), Arc::new(connection.collaborator()), ReconcilerConfig::default());
//!     let view = EventListView::new(&reconciler, QueryKey::all_events());
//!     view.load().await?;
//!
//!     let notice = view.submit_create("Annual Gala", "Fundraiser", None).await;
//!     assert_eq!(notice.message, "Event created successfully");
//!     assert_eq!(view.rows()[0].date_label, "TBA");
//!
//!     let notice = view.submit_create("", "Fundraiser", None).await;
//!     assert_eq!(notice.field("title"), ["Title is required".to_string()]);
//! #   Ok(())
//! # }
//! ```

pub use docket_core as core;
pub use docket_proto as proto;
pub use docket_signals as signals;

#[cfg(feature = "server")]
pub use docket_connector_local_process as local_process;
#[cfg(feature = "server")]
pub use docket_server as server;

// Re-export commonly used types
pub use docket_core::{
    cache::{CacheEntry, CacheStore, CachedEvent, EntryStatus, RecordKey},
    collaborator::{EventsCollaborator, TransportError},
    config::ReconcilerConfig,
    dispatcher::{FailureKind, MutationFailure},
    intent::{MutationIntent, MutationKind},
    query::QueryKey,
    reconciler::{CyclePhase, MutationOutcome, Reconciler},
    view::{EventListView, EventRow, Notice, NoticeLevel},
};
pub use docket_proto::{ActionResult, CreateEvent, DeleteEvent, EditEvent, EventId, EventRecord, FieldErrors};
