use async_trait::async_trait;
use docket_proto::{ActionResult, CreateEvent, DeleteEvent, EditEvent, EventRecord};

/// The server side of the events list, as seen from the client.
///
/// Each call is one round trip. Business failures (validation, not found) come back as
/// `Ok(ActionResult::Failure { .. })`; `Err` is reserved for failing to get an answer at all.
#[async_trait]
pub trait EventsCollaborator: Send + Sync {
    async fn create(&self, input: CreateEvent) -> Result<ActionResult<EventRecord>, TransportError>;
    async fn edit(&self, input: EditEvent) -> Result<ActionResult<EventRecord>, TransportError>;
    async fn delete(&self, input: DeleteEvent) -> Result<ActionResult<()>, TransportError>;
    /// Every event, in the server's order
    async fn list(&self) -> Result<Vec<EventRecord>, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Request timed out")]
    Timeout,
    #[error("Collaborator panicked: {0}")]
    Panicked(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}
