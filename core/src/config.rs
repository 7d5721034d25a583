use std::time::Duration;

pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Tuning for a [`crate::Reconciler`].
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Spawn a background refetch whenever a committed mutation marks a list stale.
    pub refetch_on_invalidate: bool,
    /// Give up on a collaborator call after this long. `None` waits forever.
    pub dispatch_timeout: Option<Duration>,
    /// Shown to the user when a mutation fails without a server-provided message.
    pub generic_failure_message: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            refetch_on_invalidate: true,
            dispatch_timeout: Some(DEFAULT_DISPATCH_TIMEOUT),
            generic_failure_message: DEFAULT_FAILURE_MESSAGE.to_owned(),
        }
    }
}

impl ReconcilerConfig {
    pub fn refetch_on_invalidate(mut self, enabled: bool) -> Self {
        self.refetch_on_invalidate = enabled;
        self
    }

    pub fn dispatch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn generic_failure_message(mut self, message: impl Into<String>) -> Self {
        self.generic_failure_message = message.into();
        self
    }
}
