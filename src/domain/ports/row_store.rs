//! Row store port.
//!
//! The backfill only needs two capabilities from the table it enriches:
//! list rows whose target field is unset, and patch one row by id.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::errors::BackfillResult;
use crate::domain::models::{Acknowledgement, FieldFilter, Row};

/// Column values written by a patch.
pub type RowPatch = Map<String, Value>;

#[async_trait]
pub trait RowStore: Send + Sync {
    /// Store name for diagnostics.
    fn name(&self) -> &'static str;

    /// Every row where `field` is unset, in store order.
    async fn fetch_missing(&self, field: &str) -> BackfillResult<Vec<Row>>;

    /// Write `fields` into the row identified by `id`.
    ///
    /// Fails with `BackfillError::Write` when the write is rejected. A row
    /// that does not exist yields an unsuccessful [`Acknowledgement`].
    async fn patch(&self, id: &str, fields: &RowPatch) -> BackfillResult<Acknowledgement>;

    /// Number of rows matching `filter`.
    async fn count(&self, filter: FieldFilter<'_>) -> BackfillResult<u64>;
}
