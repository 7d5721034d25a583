use docket_proto::{CreateEvent, DeleteEvent, EditEvent, EventFields, EventId, FieldErrors, TempId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutationKind {
    Create,
    Edit,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationKind::Create => write!(f, "create"),
            MutationKind::Edit => write!(f, "edit"),
            MutationKind::Delete => write!(f, "delete"),
        }
    }
}

/// A user's request to change the list. Lives for exactly one mutation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationIntent {
    Create { input: CreateEvent, optimistic_id: TempId },
    Edit(EditEvent),
    Delete(DeleteEvent),
}

impl MutationIntent {
    /// A create intent with a fresh temporary id for its speculative row.
    pub fn create(input: CreateEvent) -> Self { MutationIntent::Create { input, optimistic_id: TempId::new() } }

    pub fn edit(input: EditEvent) -> Self { MutationIntent::Edit(input) }

    pub fn delete(id: EventId) -> Self { MutationIntent::Delete(DeleteEvent::new(id)) }

    pub fn kind(&self) -> MutationKind {
        match self {
            MutationIntent::Create { .. } => MutationKind::Create,
            MutationIntent::Edit(_) => MutationKind::Edit,
            MutationIntent::Delete(_) => MutationKind::Delete,
        }
    }

    pub fn optimistic_id(&self) -> Option<TempId> {
        match self {
            MutationIntent::Create { optimistic_id, .. } => Some(*optimistic_id),
            _ => None,
        }
    }

    /// The server id this intent targets. Creates have none yet.
    pub fn target(&self) -> Option<&EventId> {
        match self {
            MutationIntent::Create { .. } => None,
            MutationIntent::Edit(input) => Some(&input.id),
            MutationIntent::Delete(input) => Some(&input.id),
        }
    }

    pub(crate) fn check_presence(&self) -> Result<(), FieldErrors> {
        match self {
            MutationIntent::Create { input, .. } => input.check_presence(),
            MutationIntent::Edit(input) => input.check_presence(),
            MutationIntent::Delete(_) => Ok(()),
        }
    }
}

impl std::fmt::Display for MutationIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MutationIntent::Create { optimistic_id, .. } => write!(f, "create {optimistic_id}"),
            MutationIntent::Edit(input) => write!(f, "edit {}", input.id),
            MutationIntent::Delete(input) => write!(f, "delete {}", input.id),
        }
    }
}
