//! Embedding backfill
//!
//! Fills in a missing vector-embedding column on a remote table. Rows whose
//! embedding is unset are fetched, embedded one by one through an embedding
//! API and patched back. The unset column is the only progress marker, so
//! a run can be interrupted and repeated safely.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): rows, reports, configuration, ports
//! - **Service Layer** (`services`): the backfill job and status report
//! - **Adapters** (`adapters`): OpenAI-compatible embeddings, PostgREST and
//!   in-memory row stores
//! - **Infrastructure Layer** (`infrastructure`): config loading, logging
//! - **CLI Layer** (`cli`): command-line interface

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

pub use domain::errors::{BackfillError, BackfillResult};
pub use domain::models::{BackfillReport, Config, EmbeddingStatus, Row, RowOutcome};
pub use domain::ports::{EmbeddingProvider, RowPatch, RowStore};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{BackfillObserver, BackfillOptions, BackfillService, StatusService};
