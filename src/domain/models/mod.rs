//! Domain models.

/// Configuration sections.
pub mod config;
/// Run outcome and status counts.
pub mod report;
/// Rows and store acknowledgements.
pub mod row;

pub use config::{
    BackfillConfig, Config, EmbeddingConfig, EmbeddingProviderKind, LoggingConfig,
    RotationPolicy, StoreConfig,
};
pub use report::{BackfillReport, EmbeddingStatus, FailureKind, RowFailure, RowOutcome};
pub use row::{Acknowledgement, FieldFilter, Row};
