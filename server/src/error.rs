use docket_proto::EventId;
use thiserror::Error;

/// Error type for event store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("event {0} already exists")]
    Duplicate(EventId),
    #[error("corrupt index entry for {0}")]
    CorruptIndex(String),
}
