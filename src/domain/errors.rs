//! Domain errors for the embedding backfill.

use thiserror::Error;

/// Errors raised while backfilling embeddings.
///
/// `Embedding` and `Write` are row-local: the job records them against the
/// row and moves on. `Configuration` and `Unexpected` end the run.
#[derive(Debug, Error)]
pub enum BackfillError {
    /// Missing or invalid settings; the job does not start.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The provider failed for one row.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// The store failed to update one row.
    #[error("Write error: {0}")]
    Write(String),

    /// Anything else, such as the candidate fetch failing.
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Result alias used across ports, adapters and services.
pub type BackfillResult<T> = Result<T, BackfillError>;
