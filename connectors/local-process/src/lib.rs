use async_trait::async_trait;
use docket_core::collaborator::{EventsCollaborator, TransportError};
use docket_proto::{ActionResult, CreateEvent, DeleteEvent, EditEvent, EventRecord};
use docket_server::EventActions;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

enum Request {
    Create(CreateEvent, oneshot::Sender<ActionResult<EventRecord>>),
    Edit(EditEvent, oneshot::Sender<ActionResult<EventRecord>>),
    Delete(DeleteEvent, oneshot::Sender<ActionResult<()>>),
    List(oneshot::Sender<Result<Vec<EventRecord>, String>>),
}

#[derive(Clone)]
/// Collaborator for a server running in the same process
pub struct LocalProcessCollaborator {
    sender: mpsc::Sender<Request>,
}

impl LocalProcessCollaborator {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(make(tx)).await.map_err(|_| TransportError::ConnectionClosed)?;
        rx.await.map_err(|_| TransportError::ConnectionClosed)
    }
}

#[async_trait]
impl EventsCollaborator for LocalProcessCollaborator {
    async fn create(&self, input: CreateEvent) -> Result<ActionResult<EventRecord>, TransportError> {
        self.request(|reply| Request::Create(input, reply)).await
    }

    async fn edit(&self, input: EditEvent) -> Result<ActionResult<EventRecord>, TransportError> { self.request(|reply| Request::Edit(input, reply)).await }

    async fn delete(&self, input: DeleteEvent) -> Result<ActionResult<()>, TransportError> { self.request(|reply| Request::Delete(input, reply)).await }

    async fn list(&self) -> Result<Vec<EventRecord>, TransportError> {
        self.request(Request::List).await?.map_err(|e| TransportError::Other(anyhow::anyhow!("server failed to list events: {e}")))
    }
}

/// Serves [`EventActions`] to any number of [`LocalProcessCollaborator`]s.
/// Requests are handled concurrently, each on its own task.
pub struct LocalProcessConnection {
    sender: mpsc::Sender<Request>,
    receiver_task: tokio::task::JoinHandle<()>,
}

impl LocalProcessConnection {
    pub fn new(actions: EventActions) -> Self {
        let (sender, rx) = mpsc::channel(100);
        let receiver_task = Self::setup_receiver(actions, rx);
        Self { sender, receiver_task }
    }

    pub fn collaborator(&self) -> LocalProcessCollaborator { LocalProcessCollaborator { sender: self.sender.clone() } }

    fn setup_receiver(actions: EventActions, mut rx: mpsc::Receiver<Request>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let actions = actions.clone();
                tokio::spawn(async move { handle(&actions, request).await });
            }
            debug!("local process connection closed");
        })
    }
}

async fn handle(actions: &EventActions, request: Request) {
    // a dropped reply receiver means the caller gave up; nothing to do
    match request {
        Request::Create(input, reply) => {
            let _ = reply.send(actions.create(input).await);
        }
        Request::Edit(input, reply) => {
            let _ = reply.send(actions.edit(input).await);
        }
        Request::Delete(input, reply) => {
            let _ = reply.send(actions.delete(input).await);
        }
        Request::List(reply) => {
            let listed = actions.list().await.map_err(|e| {
                warn!("list failed: {e}");
                e.to_string()
            });
            let _ = reply.send(listed);
        }
    }
}

impl Drop for LocalProcessConnection {
    fn drop(&mut self) { self.receiver_task.abort(); }
}
