use std::{future::Future, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use docket_proto::{ActionResult, EventRecord, FailureCode, FieldErrors};
use futures::FutureExt;
use tracing::debug;

use crate::{
    collaborator::{EventsCollaborator, TransportError},
    intent::MutationIntent,
};

/// Why a mutation did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The payload was rejected, by the presence check or by the server
    Validation,
    /// The targeted record does not exist on the server
    NotFound,
    /// The server said no for some other reason
    Rejected,
    /// No usable answer came back
    Transport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFailure {
    pub kind: FailureKind,
    pub message: String,
    pub errors: Option<FieldErrors>,
}

impl MutationFailure {
    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self { kind: FailureKind::Validation, message: message.into(), errors: Some(errors) }
    }

    pub fn transport(message: impl Into<String>) -> Self { Self { kind: FailureKind::Transport, message: message.into(), errors: None } }
}

impl std::fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{:?}: {}", self.kind, self.message) }
}

/// A normalized server answer to one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatched {
    /// `data` is the authoritative record for create and edit, `None` for delete.
    Success { data: Option<EventRecord>, message: String },
    Failure(MutationFailure),
}

/// Turns an intent into exactly one collaborator call.
#[derive(Clone)]
pub struct Dispatcher {
    collaborator: Arc<dyn EventsCollaborator>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    pub const INVALID_MESSAGE: &'static str = "Please fix the highlighted fields";

    pub fn new(collaborator: Arc<dyn EventsCollaborator>, timeout: Option<Duration>) -> Self { Self { collaborator, timeout } }

    /// The only client-side validation: required fields must be present.
    pub fn precheck(&self, intent: &MutationIntent) -> Result<(), MutationFailure> {
        intent.check_presence().map_err(|errors| MutationFailure::validation(Self::INVALID_MESSAGE, errors))
    }

    /// Send `intent` to the server. A failed precheck is answered locally without a call.
    ///
    /// `Err` means no answer: the connection failed, the call timed out, or the collaborator panicked.
    pub async fn dispatch(&self, intent: &MutationIntent) -> Result<Dispatched, TransportError> {
        if let Err(failure) = self.precheck(intent) {
            return Ok(Dispatched::Failure(failure));
        }
        debug!("dispatching {intent}");

        let dispatched = match intent {
            MutationIntent::Create { input, .. } => normalize(self.call(self.collaborator.create(input.clone())).await?.map(Some)),
            MutationIntent::Edit(input) => normalize(self.call(self.collaborator.edit(input.clone())).await?.map(Some)),
            MutationIntent::Delete(input) => normalize(self.call(self.collaborator.delete(input.clone())).await?.map(|()| None)),
        };

        // a success that should carry the record but doesn't can't be committed
        if let (MutationIntent::Create { .. } | MutationIntent::Edit(_), Dispatched::Success { data: None, .. }) = (intent, &dispatched) {
            return Err(TransportError::UnexpectedResponse(format!("{intent} succeeded without a record")));
        }
        Ok(dispatched)
    }

    pub async fn list(&self) -> Result<Vec<EventRecord>, TransportError> { self.call(self.collaborator.list()).await }

    async fn call<T>(&self, request: impl Future<Output = Result<T, TransportError>>) -> Result<T, TransportError> {
        let guarded = AssertUnwindSafe(request).catch_unwind();
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, guarded).await.map_err(|_| TransportError::Timeout)?,
            None => guarded.await,
        };
        outcome.map_err(|panic| TransportError::Panicked(panic_message(panic.as_ref())))?
    }
}

fn normalize(result: ActionResult<Option<EventRecord>>) -> Dispatched {
    match result {
        ActionResult::Success { data, message } => Dispatched::Success { data, message },
        ActionResult::Failure { message, errors, code } => {
            let kind = match (code, &errors) {
                (Some(FailureCode::NotFound), _) => FailureKind::NotFound,
                (Some(FailureCode::Validation), _) | (_, Some(_)) => FailureKind::Validation,
                _ => FailureKind::Rejected,
            };
            Dispatched::Failure(MutationFailure { kind, message, errors })
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
