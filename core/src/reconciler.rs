mod cycle;

pub use cycle::CyclePhase;

use std::sync::Arc;

use dashmap::DashMap;
use docket_proto::{CreateEvent, EditEvent, EventId, EventRecord, FieldErrors};
use docket_signals::{Mut, Read};
use tracing::{debug, warn};

use crate::{
    action_info, action_warn,
    cache::{CacheEntry, CacheStore},
    collaborator::EventsCollaborator,
    config::ReconcilerConfig,
    dispatcher::{Dispatched, Dispatcher, FailureKind, MutationFailure},
    error::RetrievalError,
    intent::{MutationIntent, MutationKind},
    query::QueryKey,
};
use cycle::MutationCycle;

/// How a mutation cycle ended. Failures never escape a cycle as errors; they end up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The server accepted the change and the cache holds the authoritative result
    Committed { kind: MutationKind, data: Option<EventRecord>, message: String },
    /// The change did not go through and the cache is as it was before the cycle
    Failed { kind: MutationKind, failure: MutationFailure },
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool { matches!(self, MutationOutcome::Committed { .. }) }

    pub fn kind(&self) -> MutationKind {
        match self {
            MutationOutcome::Committed { kind, .. } | MutationOutcome::Failed { kind, .. } => *kind,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            MutationOutcome::Committed { message, .. } => message,
            MutationOutcome::Failed { failure, .. } => &failure.message,
        }
    }

    pub fn record(&self) -> Option<&EventRecord> {
        match self {
            MutationOutcome::Committed { data, .. } => data.as_ref(),
            MutationOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&MutationFailure> {
        match self {
            MutationOutcome::Committed { .. } => None,
            MutationOutcome::Failed { failure, .. } => Some(failure),
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> { self.failure().and_then(|f| f.errors.as_ref()) }
}

struct KeyState {
    /// Held by the cycle in flight; waiters queue in FIFO order
    turn: Arc<tokio::sync::Mutex<()>>,
    phase: Arc<Mut<CyclePhase>>,
}

struct Inner {
    store: CacheStore,
    dispatcher: Dispatcher,
    config: ReconcilerConfig,
    keys: DashMap<QueryKey, Arc<KeyState>>,
}

/// The single writer of a [`CacheStore`].
///
/// Every change to a cached list goes through here: initial fetches, background refetches, and
/// optimistic mutation cycles. Cycles on the same query key run one at a time, in submission order.
#[derive(Clone)]
pub struct Reconciler(Arc<Inner>);

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").field("store", &self.0.store).field("config", &self.0.config).finish()
    }
}

impl Reconciler {
    pub fn new(store: CacheStore, collaborator: Arc<dyn EventsCollaborator>, config: ReconcilerConfig) -> Self {
        let dispatcher = Dispatcher::new(collaborator, config.dispatch_timeout);
        Self(Arc::new(Inner { store, dispatcher, config, keys: DashMap::new() }))
    }

    pub fn store(&self) -> &CacheStore { &self.0.store }

    pub fn dispatcher(&self) -> &Dispatcher { &self.0.dispatcher }

    pub fn config(&self) -> &ReconcilerConfig { &self.0.config }

    pub fn entry(&self, key: &QueryKey) -> Arc<CacheEntry> { self.0.store.entry(key) }

    pub fn subscribe(&self, key: &QueryKey) -> Read<CacheEntry> { self.0.store.read(key) }

    /// The mutation phase of `key`, as a signal.
    pub fn phase(&self, key: &QueryKey) -> Read<CyclePhase> { self.key_state(key).phase.read() }

    fn key_state(&self, key: &QueryKey) -> Arc<KeyState> {
        self.0
            .keys
            .entry(key.clone())
            .or_insert_with(|| Arc::new(KeyState { turn: Arc::new(tokio::sync::Mutex::new(())), phase: Arc::new(Mut::new(CyclePhase::Idle)) }))
            .clone()
    }

    /// Load the list from the server. If a mutation is pending on the key, or one starts while the
    /// call is out, the mutation wins and the fetched list is dropped.
    pub async fn fetch(&self, key: &QueryKey) -> Result<Arc<CacheEntry>, RetrievalError> {
        self.refetch(key).await?;
        Ok(self.entry(key))
    }

    /// Like [`Reconciler::fetch`], returning whether the fetched list made it into the cache.
    pub async fn refetch(&self, key: &QueryKey) -> Result<bool, RetrievalError> {
        let ticket = self.0.store.fetch_ticket(key);
        let records = self.0.dispatcher.list().await?;
        let count = records.len();
        let written = self.0.store.complete_fetch(ticket, records);
        if written {
            debug!("fetched {count} events into {key}");
        } else {
            debug!("discarded fetch of {key}: a mutation cycle overlapped it");
        }
        Ok(written)
    }

    /// Mark `key` stale and, if configured, refetch it in the background.
    pub fn invalidate(&self, key: &QueryKey) {
        self.0.store.mark_stale(key);
        self.schedule_refetch(key);
    }

    /// Refetch `key` in the background, if configured to. A mutation cycle beginning on the key
    /// aborts the task.
    fn schedule_refetch(&self, key: &QueryKey) {
        if !self.0.config.refetch_on_invalidate {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no runtime to refetch {key} on; leaving it stale");
            return;
        };
        let task = {
            let reconciler = self.clone();
            let key = key.clone();
            runtime.spawn(async move {
                if let Err(e) = reconciler.refetch(&key).await {
                    warn!("background refetch of {key} failed: {e}");
                }
            })
        };
        self.0.store.set_refetch_task(key, task.abort_handle());
    }

    pub async fn create(&self, key: &QueryKey, input: CreateEvent) -> MutationOutcome { self.submit(key, MutationIntent::create(input)).await }

    pub async fn edit(&self, key: &QueryKey, input: EditEvent) -> MutationOutcome { self.submit(key, MutationIntent::edit(input)).await }

    pub async fn delete(&self, key: &QueryKey, id: EventId) -> MutationOutcome { self.submit(key, MutationIntent::delete(id)).await }

    /// Run one full mutation cycle for `intent` against the list under `key`.
    ///
    /// A payload that fails the presence check is answered without touching the cache or the
    /// server. Otherwise the speculative change is visible to subscribers before this yields, and
    /// by the time it returns the cache holds either the committed result or the exact snapshot.
    pub async fn submit(&self, key: &QueryKey, intent: MutationIntent) -> MutationOutcome {
        let kind = intent.kind();
        if let Err(failure) = self.0.dispatcher.precheck(&intent) {
            return MutationOutcome::Failed { kind, failure };
        }

        let state = self.key_state(key);
        let turn = state.turn.clone().lock_owned().await;
        let cycle = match MutationCycle::begin(self, key, intent, state.phase.clone(), turn) {
            Ok(cycle) => cycle,
            Err(e) => {
                warn!("could not start cycle on {key}: {e}");
                return MutationOutcome::Failed { kind, failure: MutationFailure::transport(self.0.config.generic_failure_message.clone()) };
            }
        };
        action_info!(cycle, "pending");

        let dispatched = match self.0.dispatcher.dispatch(cycle.intent()).await {
            Ok(dispatched) => dispatched,
            Err(e) => {
                action_warn!(cycle, "transport failure", "{}", e);
                Dispatched::Failure(MutationFailure::transport(self.0.config.generic_failure_message.clone()))
            }
        };

        let label = cycle.to_string();
        match dispatched {
            Dispatched::Success { data, message } => {
                if let Err(e) = cycle.commit(data.as_ref()) {
                    warn!("{label}: {e}");
                }
                action_info!(label, "committed", "{}", message);
                MutationOutcome::Committed { kind, data, message }
            }
            Dispatched::Failure(failure) => {
                // the server may have applied a change whose reply never arrived
                let resync = failure.kind == FailureKind::Transport;
                if let Err(e) = cycle.rollback(resync) {
                    warn!("{label}: {e}");
                }
                action_info!(label, "rolled back", "{}", failure);
                MutationOutcome::Failed { kind, failure }
            }
        }
    }
}
