use std::sync::{Arc, Mutex, RwLock};

use crate::broadcast::Broadcast;
use crate::signal::Read;

/// Writable end of a signal. Holding a `Mut` is what grants the right to change the value;
/// everything downstream gets a [`Read`].
///
/// Writes are notified in the order they were made: a write waits until subscribers have heard
/// about the previous one. Listeners may read the signal, but must not write to the one they are
/// listening to.
pub struct Mut<T> {
    pub(crate) value: Arc<RwLock<Arc<T>>>,
    pub(crate) broadcast: Broadcast<Arc<T>>,
    /// Held from a write until its notification has been sent
    order: Mutex<()>,
}

impl<T> Mut<T> {
    pub fn new(value: T) -> Self { Self { value: Arc::new(RwLock::new(Arc::new(value))), broadcast: Broadcast::new(), order: Mutex::new(()) } }

    /// Replace the value and notify every subscriber with the new one.
    pub fn set(&self, value: T) { self.set_arc(Arc::new(value)) }

    pub fn set_arc(&self, value: Arc<T>) {
        let _order = self.order.lock().expect("Failed to lock signal order");
        {
            let mut current = self.value.write().expect("Failed to lock signal value");
            *current = value.clone();
        }
        self.broadcast.send(value);
    }

    /// Compute a replacement from the current value and publish it.
    /// Returns the previous value.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Arc<T> {
        let _order = self.order.lock().expect("Failed to lock signal order");
        let (previous, next) = {
            let mut current = self.value.write().expect("Failed to lock signal value");
            let next = Arc::new(f(&**current));
            let previous = std::mem::replace(&mut *current, next.clone());
            (previous, next)
        };
        self.broadcast.send(next);
        previous
    }

    /// Like [`Mut::update`], but `f` may decline to change anything by returning `None`.
    /// The decision and the write happen under one lock. Returns whether a value was published.
    pub fn try_update(&self, f: impl FnOnce(&T) -> Option<T>) -> bool {
        let _order = self.order.lock().expect("Failed to lock signal order");
        let next = {
            let mut current = self.value.write().expect("Failed to lock signal value");
            match f(&**current) {
                Some(next) => {
                    let next = Arc::new(next);
                    *current = next.clone();
                    next
                }
                None => return false,
            }
        };
        self.broadcast.send(next);
        true
    }

    pub fn peek(&self) -> Arc<T> { self.value.read().expect("Failed to lock signal value").clone() }

    pub fn read(&self) -> Read<T> { Read { value: self.value.clone(), broadcast: self.broadcast.clone() } }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Mut<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_tuple("Mut").field(&self.peek()).finish() }
}
