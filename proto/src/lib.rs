//! Wire types exchanged between the Docket client cache and its server collaborator.

pub mod error;
pub mod event;
pub mod id;
pub mod result;

pub use error::*;
pub use event::*;
pub use id::*;
pub use result::*;
