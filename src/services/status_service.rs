//! Read-only embedding coverage report.

use std::sync::Arc;

use crate::domain::errors::BackfillResult;
use crate::domain::models::{EmbeddingStatus, FieldFilter};
use crate::domain::ports::RowStore;

/// Counts rows with and without the target field.
pub struct StatusService<S: RowStore + ?Sized> {
    store: Arc<S>,
}

impl<S: RowStore + ?Sized> StatusService<S> {
    /// Service over `store`.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Count total, embedded and missing rows for `field`.
    pub async fn status(&self, field: &str) -> BackfillResult<EmbeddingStatus> {
        let total = self.store.count(FieldFilter::All).await?;
        let embedded = self.store.count(FieldFilter::Set(field)).await?;
        let missing = self.store.count(FieldFilter::Unset(field)).await?;
        tracing::debug!(total, embedded, missing, "embedding status");
        Ok(EmbeddingStatus {
            total,
            embedded,
            missing,
        })
    }
}
