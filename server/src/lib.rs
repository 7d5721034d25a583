//! The server collaborator for Docket: stores events, applies create/edit/delete with server-side
//! validation, and exposes them as JSON over HTTP.

pub mod actions;
pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod sled_store;
pub mod state;
pub mod store;

pub use actions::EventActions;
pub use config::ServerConfig;
pub use error::StoreError;
pub use server::{router, Server, ServerBuilder};
pub use sled_store::SledEventStore;
pub use store::{EventStore, MemoryEventStore};
