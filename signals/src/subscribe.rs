use std::any::Any;

use crate::broadcast::{BroadcastId, ListenerGuard};

/// Keeps a signal subscription alive. The listener is removed when this is dropped.
#[must_use = "the subscription ends as soon as the guard is dropped"]
pub struct SubscriptionGuard {
    broadcast_id: BroadcastId,
    _guard: Box<dyn Any + Send + Sync>,
}

impl SubscriptionGuard {
    pub fn new<T: 'static>(guard: ListenerGuard<T>) -> Self
    where ListenerGuard<T>: Send + Sync {
        Self { broadcast_id: guard.broadcast_id(), _guard: Box::new(guard) }
    }

    pub fn broadcast_id(&self) -> BroadcastId { self.broadcast_id }
}

impl std::fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionGuard").field("broadcast", &self.broadcast_id).finish()
    }
}
