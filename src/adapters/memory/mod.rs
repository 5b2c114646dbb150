//! In-process adapters.

pub mod row_store;

pub use row_store::InMemoryRowStore;
