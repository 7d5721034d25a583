use std::{collections::HashMap, hash::Hash};

/// A small concurrent map for handles that are looked up often and created rarely.
/// Locks are only held for the duration of a single map operation; values are cloned out.
pub struct SafeMap<K: Hash + Eq, V>(std::sync::RwLock<HashMap<K, V>>);

impl<K: Hash + Eq, V> Default for SafeMap<K, V> {
    fn default() -> Self { Self::new() }
}

impl<K: Hash + Eq, V> SafeMap<K, V> {
    pub fn new() -> Self { Self(std::sync::RwLock::new(HashMap::new())) }

    pub fn remove(&self, key: &K) -> Option<V> { self.0.write().expect("Failed to lock the map").remove(key) }

    pub fn len(&self) -> usize { self.0.read().expect("Failed to lock the map").len() }

    pub fn is_empty(&self) -> bool { self.0.read().expect("Failed to lock the map").is_empty() }

    pub fn contains_key(&self, key: &K) -> bool { self.0.read().expect("Failed to lock the map").contains_key(key) }
}

impl<K: Hash + Eq, V: Clone> SafeMap<K, V> {
    pub fn get(&self, k: &K) -> Option<V> { self.0.read().expect("Failed to lock the map").get(k).cloned() }

    /// Get the value for `k`, creating it with `f` if absent. `f` runs under the write lock, so it must not block.
    pub fn get_or_insert_with(&self, k: K, f: impl FnOnce() -> V) -> V {
        if let Some(v) = self.0.read().expect("Failed to lock the map").get(&k) {
            return v.clone();
        }
        self.0.write().expect("Failed to lock the map").entry(k).or_insert_with(f).clone()
    }
}

impl<K: Hash + Eq + Clone, V> SafeMap<K, V> {
    pub fn keys(&self) -> Vec<K> { self.0.read().expect("Failed to lock the map").keys().cloned().collect() }
}

impl<K: Hash + Eq + std::fmt::Debug, V: std::fmt::Debug> std::fmt::Debug for SafeMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SafeMap {{ {:?} }}", self.0.read().expect("Failed to lock the map"))
    }
}
