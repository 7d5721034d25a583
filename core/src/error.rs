use thiserror::Error;

use crate::{collaborator::TransportError, reconciler::CyclePhase};

/// Error type for loading a list into the cache.
///
/// Returned from: `Reconciler::fetch`, `Reconciler::refetch`, `EventListView::load`
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),
}

/// A mutation cycle was asked to move between phases out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid cycle transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: CyclePhase,
    pub to: CyclePhase,
}
