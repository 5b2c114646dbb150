//! Domain layer: models, ports and errors for the embedding backfill.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{BackfillError, BackfillResult};
