//! In-memory adapters for task lifecycle persistence.

mod store;

pub use store::InMemoryStore;
