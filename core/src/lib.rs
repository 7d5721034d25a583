/*!
Optimistic mutations over a reconciled list cache.

A [`Reconciler`] owns every write to a [`CacheStore`]. Submitting a create, edit or delete applies
the change to the cached list at once, sends it to the server through an [`EventsCollaborator`],
then either commits the server's record or puts the list back exactly as it was. Views such as
[`EventListView`] only ever read the cache.
*/

#[macro_use]
pub mod util;

pub mod cache;
pub mod collaborator;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod intent;
pub mod query;
pub mod reconciler;
pub mod view;

pub use cache::{CacheEntry, CacheStore, CachedEvent, EntryStatus, RecordKey};
pub use collaborator::{EventsCollaborator, TransportError};
pub use config::ReconcilerConfig;
pub use dispatcher::{Dispatched, Dispatcher, FailureKind, MutationFailure};
pub use error::{InvalidTransition, RetrievalError};
pub use intent::{MutationIntent, MutationKind};
pub use query::QueryKey;
pub use reconciler::{CyclePhase, MutationOutcome, Reconciler};
pub use view::{EventListView, EventRow, Notice, NoticeLevel};

pub use docket_proto as proto;
pub use docket_signals as signals;
