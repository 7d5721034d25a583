use std::sync::{Arc, RwLock};

use crate::broadcast::{Broadcast, BroadcastId, IntoListener};
use crate::subscribe::SubscriptionGuard;

/// Read-only handle onto a [`crate::Mut`]. Cheap to clone; all clones see the same value.
pub struct Read<T> {
    pub(crate) value: Arc<RwLock<Arc<T>>>,
    pub(crate) broadcast: Broadcast<Arc<T>>,
}

impl<T> Clone for Read<T> {
    fn clone(&self) -> Self { Self { value: self.value.clone(), broadcast: self.broadcast.clone() } }
}

impl<T> Read<T> {
    pub fn get(&self) -> Arc<T> { self.value.read().expect("Failed to lock signal value").clone() }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.read().expect("Failed to lock signal value");
        f(&**guard)
    }

    pub fn id(&self) -> BroadcastId { self.broadcast.id() }
}

impl<T: Send + Sync + 'static> Read<T> {
    /// Called with every value published after this point. Dropping the guard unsubscribes.
    pub fn subscribe<L: IntoListener<Arc<T>>>(&self, listener: L) -> SubscriptionGuard {
        SubscriptionGuard::new(self.broadcast.listen(listener))
    }

    /// Like [`Read::subscribe`], but the listener is also called immediately with the present value.
    pub fn subscribe_now<F>(&self, listener: F) -> SubscriptionGuard
    where F: Fn(Arc<T>) + Send + Sync + 'static {
        let listener = Arc::new(listener);
        let guard = {
            let listener = listener.clone();
            self.subscribe(move |value: Arc<T>| listener(value))
        };
        listener(self.get());
        guard
    }
}

#[cfg(feature = "tokio")]
impl<T: Send + Sync + 'static> Read<T> {
    /// Resolve once the value satisfies `predicate`, checking the present value first.
    pub async fn wait_for<F>(&self, predicate: F) -> Arc<T>
    where F: Fn(&T) -> bool {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Arc<T>>();
        let _guard = self.subscribe(tx);

        let current = self.get();
        if predicate(&*current) {
            return current;
        }
        while let Some(value) = rx.recv().await {
            if predicate(&*value) {
                return value;
            }
        }
        // the sender lives in the listener we hold, so the channel never closes first
        std::future::pending().await
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Read<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_tuple("Read").field(&self.get()).finish() }
}
