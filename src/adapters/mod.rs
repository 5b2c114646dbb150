//! Concrete implementations of the domain ports.

pub mod embeddings;
pub mod memory;
pub mod postgrest;
