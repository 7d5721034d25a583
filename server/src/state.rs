use crate::actions::EventActions;

#[derive(Clone)]
pub struct ServerState {
    actions: EventActions,
}

impl ServerState {
    pub fn new(actions: EventActions) -> Self { Self { actions } }

    pub fn actions(&self) -> &EventActions { &self.actions }
}
