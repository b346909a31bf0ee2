//! Storage backends for groomdesk.

pub mod in_memory;
pub mod travel;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::{InMemoryStore, WriteOp};
pub use travel::TravelTimeTable;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;
