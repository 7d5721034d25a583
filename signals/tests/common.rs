use std::sync::{Arc, Mutex};

/// Collects every value a listener is called with, so a test can drain them in order.
#[derive(Clone)]
pub struct Recorder<T>(Arc<Mutex<Vec<T>>>);

#[allow(unused)]
impl<T: Send + 'static> Recorder<T> {
    pub fn new() -> Self { Self(Arc::new(Mutex::new(Vec::new()))) }

    /// A listener that records a value derived from each notification.
    pub fn listener<V: 'static>(&self, f: impl Fn(V) -> T + Send + Sync + 'static) -> Box<dyn Fn(V) + Send + Sync> {
        let seen = self.0.clone();
        Box::new(move |value| seen.lock().unwrap().push(f(value)))
    }

    pub fn take(&self) -> Vec<T> { std::mem::take(&mut *self.0.lock().unwrap()) }
}
