use serde::{Serialize, Serializer};
use std::{fmt, sync::Arc};

/// Stable name of a cached list. Snapshot, invalidate and refetch are all scoped to one key.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Arc<str>);

impl QueryKey {
    pub const ALL_EVENTS: &'static str = "events/all";

    pub fn new(name: impl AsRef<str>) -> Self { QueryKey(name.as_ref().into()) }

    /// The list of every event, in server insertion order.
    pub fn all_events() -> Self { Self::new(Self::ALL_EVENTS) }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl fmt::Debug for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "QueryKey({})", self.0) }
}

impl From<&str> for QueryKey {
    fn from(name: &str) -> Self { Self::new(name) }
}

impl Serialize for QueryKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> { serializer.serialize_str(&self.0) }
}
