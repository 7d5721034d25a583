mod mutable;
mod read;

pub use mutable::*;
pub use read::*;
