use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Identifies one broadcast for as long as any handle to it is alive.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct BroadcastId(usize);

impl std::fmt::Display for BroadcastId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "B{}", self.0) }
}

/// Something that wants to hear about values sent on a broadcast.
#[derive(Clone)]
pub enum Listener<T> {
    /// Receives the sent value
    Payload(Arc<dyn Fn(T) + Send + Sync + 'static>),
    /// Only learns that something was sent
    NotifyOnly(Arc<dyn Fn() + Send + Sync + 'static>),
}

pub trait IntoListener<T> {
    fn into_listener(self) -> Listener<T>;
}

/// Synchronous fan-out of values to a set of listeners.
///
/// Listeners are invoked on the sending thread, in registration order, with no internal lock held,
/// so a listener may freely register or drop other listeners while it runs.
pub struct Broadcast<T>(Arc<Inner<T>>);

struct Inner<T> {
    listeners: RwLock<BTreeMap<usize, Listener<T>>>,
    next_id: AtomicUsize,
}

impl<T> Clone for Broadcast<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T> std::fmt::Debug for Broadcast<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcast").field("id", &self.id()).field("listeners", &self.listener_count()).finish()
    }
}

impl<T: Clone> Default for Broadcast<T> {
    fn default() -> Self { Self::new() }
}

impl<T> Broadcast<T> {
    pub fn id(&self) -> BroadcastId { BroadcastId(Arc::as_ptr(&self.0) as *const () as usize) }

    pub fn listener_count(&self) -> usize { self.0.listeners.read().expect("Failed to lock listeners").len() }

    /// Register a listener. It stays registered until the returned guard is dropped.
    pub fn listen<L: IntoListener<T>>(&self, listener: L) -> ListenerGuard<T> {
        let id = self.0.next_id.fetch_add(1, Ordering::Relaxed);
        self.0.listeners.write().expect("Failed to lock listeners").insert(id, listener.into_listener());
        ListenerGuard { inner: Arc::downgrade(&self.0), id }
    }
}

impl<T: Clone> Broadcast<T> {
    pub fn new() -> Self { Self(Arc::new(Inner { listeners: RwLock::new(BTreeMap::new()), next_id: AtomicUsize::new(0) })) }

    pub fn send(&self, value: T) {
        let listeners: Vec<Listener<T>> = self.0.listeners.read().expect("Failed to lock listeners").values().cloned().collect();

        if let Some((last, rest)) = listeners.split_last() {
            for listener in rest {
                listener.call(value.clone());
            }
            last.call(value);
        }
    }
}

impl<T> Listener<T> {
    fn call(&self, value: T) {
        match self {
            Listener::Payload(f) => f(value),
            Listener::NotifyOnly(f) => f(),
        }
    }
}

/// Keeps a listener registered. Does not keep the broadcast alive.
pub struct ListenerGuard<T> {
    inner: Weak<Inner<T>>,
    id: usize,
}

impl<T> ListenerGuard<T> {
    pub fn broadcast_id(&self) -> BroadcastId { BroadcastId(self.inner.as_ptr() as *const () as usize) }
}

impl<T> Drop for ListenerGuard<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.listeners.write().expect("Failed to lock listeners").remove(&self.id);
            tracing::trace!("listener {} removed from {}", self.id, self.broadcast_id());
        }
    }
}

impl<F, T> IntoListener<T> for F
where F: Fn(T) + Send + Sync + 'static
{
    fn into_listener(self) -> Listener<T> { Listener::Payload(Arc::new(self)) }
}

impl<T> IntoListener<T> for Listener<T> {
    fn into_listener(self) -> Listener<T> { self }
}

impl<T> IntoListener<T> for Arc<dyn Fn() + Send + Sync + 'static> {
    fn into_listener(self) -> Listener<T> { Listener::NotifyOnly(self) }
}

#[cfg(feature = "tokio")]
impl<T> IntoListener<T> for tokio::sync::mpsc::UnboundedSender<T>
where T: Send + 'static
{
    fn into_listener(self) -> Listener<T> {
        Listener::Payload(Arc::new(move |value| {
            // a closed receiver just means nobody is watching anymore
            let _ = self.send(value);
        }))
    }
}
