#![allow(unused)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docket::{
    ActionResult, CacheStore, CreateEvent, DeleteEvent, EditEvent, EventId, EventListView, EventRecord, EventsCollaborator, FieldErrors,
    QueryKey, Reconciler, ReconcilerConfig, TransportError,
};
use docket_server::{EventActions, EventStore, MemoryEventStore};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() { tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init(); }

/// What the next mutation call should do instead of reaching the real actions.
#[derive(Debug, Clone)]
pub enum Script {
    Reject(String),
    Invalid(FieldErrors),
    Disconnect,
    Panic,
    Hang,
    /// Apply the change, then never answer
    LostReply,
}

/// A collaborator backed by real server actions over an in-memory store, with knobs for holding
/// calls open and injecting failures.
pub struct ScriptedServer {
    store: Arc<MemoryEventStore>,
    actions: EventActions,
    script: Mutex<VecDeque<Script>>,
    mutation_gate: Mutex<Option<Arc<Semaphore>>>,
    list_gate: Mutex<Option<Arc<Semaphore>>>,
    mutations: AtomicUsize,
    lists: AtomicUsize,
}

impl ScriptedServer {
    pub fn new() -> Arc<Self> {
        let store = Arc::new(MemoryEventStore::new());
        Arc::new(Self {
            actions: EventActions::new(store.clone()),
            store,
            script: Mutex::new(VecDeque::new()),
            mutation_gate: Mutex::new(None),
            list_gate: Mutex::new(None),
            mutations: AtomicUsize::new(0),
            lists: AtomicUsize::new(0),
        })
    }

    /// Put a record straight into the server's store.
    pub async fn seed(&self, record: EventRecord) { self.store.insert(record).await.unwrap(); }

    /// Remove a record behind the client's back.
    pub async fn forget(&self, id: &EventId) { self.store.remove(id).await.unwrap(); }

    pub async fn records(&self) -> Vec<EventRecord> { self.store.list().await.unwrap() }

    pub fn push_script(&self, script: Script) { self.script.lock().unwrap().push_back(script); }

    /// Mutation calls wait until released from here on.
    pub fn hold_mutations(&self) -> Arc<Semaphore> { Self::hold(&self.mutation_gate) }

    /// List calls wait until released from here on.
    pub fn hold_lists(&self) -> Arc<Semaphore> { Self::hold(&self.list_gate) }

    pub fn mutations(&self) -> usize { self.mutations.load(Ordering::SeqCst) }

    pub fn lists(&self) -> usize { self.lists.load(Ordering::SeqCst) }

    /// Wait until at least `n` list calls have reached the server.
    pub async fn lists_reached(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.lists() < n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("list call never arrived");
    }

    fn hold(slot: &Mutex<Option<Arc<Semaphore>>>) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *slot.lock().unwrap() = Some(gate.clone());
        gate
    }

    async fn pass(slot: &Mutex<Option<Arc<Semaphore>>>) {
        let gate = slot.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }

    /// Count the call, wait at the gate, then play the next script entry, or run `action` if there
    /// is none.
    async fn mutation<T, F>(&self, action: F) -> Result<ActionResult<T>, TransportError>
    where F: Future<Output = ActionResult<T>> + Send {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.mutation_gate).await;
        let script = self.script.lock().unwrap().pop_front();
        match script {
            None => Ok(action.await),
            Some(Script::Reject(message)) => Ok(ActionResult::failure(message)),
            Some(Script::Invalid(errors)) => Ok(ActionResult::invalid("Invalid event data", errors)),
            Some(Script::Disconnect) => Err(TransportError::ConnectionClosed),
            Some(Script::Panic) => panic!("collaborator exploded"),
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::LostReply) => {
                let _ = action.await;
                std::future::pending().await
            }
        }
    }
}

#[async_trait]
impl EventsCollaborator for ScriptedServer {
    async fn create(&self, input: CreateEvent) -> Result<ActionResult<EventRecord>, TransportError> {
        self.mutation(self.actions.create(input)).await
    }

    async fn edit(&self, input: EditEvent) -> Result<ActionResult<EventRecord>, TransportError> { self.mutation(self.actions.edit(input)).await }

    async fn delete(&self, input: DeleteEvent) -> Result<ActionResult<()>, TransportError> { self.mutation(self.actions.delete(input)).await }

    async fn list(&self) -> Result<Vec<EventRecord>, TransportError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        Self::pass(&self.list_gate).await;
        Ok(self.actions.list().await.map_err(anyhow::Error::from)?)
    }
}

pub fn record(id: &str, title: &str, body: &str) -> EventRecord {
    let at: DateTime<Utc> = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
    EventRecord { id: EventId::parse(id).unwrap(), title: title.into(), body: body.into(), event_date: None, created_at: at, updated_at: at }
}

pub fn id(id: &str) -> EventId { EventId::parse(id).unwrap() }

/// Reconciler and view over a scripted server, without background refetches unless asked for.
pub fn setup(config: ReconcilerConfig) -> (Arc<ScriptedServer>, Reconciler, EventListView) {
    let server = ScriptedServer::new();
    let reconciler = Reconciler::new(CacheStore::new(), server.clone(), config);
    let view = EventListView::new(&reconciler, QueryKey::all_events());
    (server, reconciler, view)
}

pub fn quiet() -> ReconcilerConfig { ReconcilerConfig::default().refetch_on_invalidate(false) }

/// The cache entry under `key`, serialized, for exact before/after comparisons.
pub fn serialized(reconciler: &Reconciler, key: &QueryKey) -> Vec<u8> { serde_json::to_vec(&*reconciler.entry(key)).unwrap() }
