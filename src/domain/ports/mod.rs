//! Ports for the backfill's external collaborators.

pub mod embedding;
pub mod row_store;

pub use embedding::EmbeddingProvider;
pub use row_store::{RowPatch, RowStore};
