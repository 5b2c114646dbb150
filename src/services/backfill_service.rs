//! Embedding backfill job.
//!
//! Fetches every row whose embedding field is unset, embeds its text and
//! writes the vector back, one row at a time by default. A failing row is
//! recorded and skipped; it keeps its unset field and is picked up again by
//! the next run.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::errors::{BackfillError, BackfillResult};
use crate::domain::models::{BackfillReport, FailureKind, Row, RowFailure, RowOutcome};
use crate::domain::ports::{EmbeddingProvider, RowPatch, RowStore};

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct BackfillOptions {
    /// Field that receives the vector; rows where it is unset are candidates.
    pub field: String,
    /// Rows in flight at once. 1 keeps the run sequential.
    pub concurrency: usize,
    /// Cap on rows attempted this run.
    pub max_rows: Option<usize>,
    /// Reject vectors of any other length.
    pub expected_dimension: Option<usize>,
}

impl Default for BackfillOptions {
    fn default() -> Self {
        Self {
            field: "embedding".to_string(),
            concurrency: 1,
            max_rows: None,
            expected_dimension: None,
        }
    }
}

/// Receives progress while a run is underway.
pub trait BackfillObserver: Sync {
    /// Called once after candidates are fetched. `found` is the full
    /// candidate count, `selected` what this run will attempt.
    fn on_start(&self, _found: usize, _selected: usize) {}

    /// Called before a row's provider call. `position` is 1-based.
    fn on_row_start(&self, _position: usize, _total: usize, _row: &Row) {}

    /// Called after each row finishes, in fetch order.
    fn on_row(&self, _position: usize, _total: usize, _row: &Row, _outcome: &RowOutcome) {}
}

/// Observer that ignores everything.
impl BackfillObserver for () {}

/// Embeds and writes every row whose target field is unset.
pub struct BackfillService<P: EmbeddingProvider + ?Sized, S: RowStore + ?Sized> {
    provider: Arc<P>,
    store: Arc<S>,
    options: BackfillOptions,
}

impl<P: EmbeddingProvider + ?Sized, S: RowStore + ?Sized> BackfillService<P, S> {
    /// Service with default options.
    pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
        Self {
            provider,
            store,
            options: BackfillOptions::default(),
        }
    }

    /// Replace the run options.
    pub fn with_options(mut self, options: BackfillOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the backfill to completion.
    ///
    /// Only a failing candidate fetch ends the run early; per-row failures
    /// are folded into the returned report.
    #[tracing::instrument(
        skip_all,
        fields(field = %self.options.field, provider = self.provider.name(), store = self.store.name())
    )]
    pub async fn run(&self, observer: &dyn BackfillObserver) -> BackfillResult<BackfillReport> {
        let mut rows = self
            .store
            .fetch_missing(&self.options.field)
            .await
            .map_err(into_unexpected)?;

        let found = rows.len();
        if let Some(max_rows) = self.options.max_rows {
            rows.truncate(max_rows);
        }
        let total = rows.len();
        observer.on_start(found, total);
        info!(found, selected = total, "fetched rows without embeddings");

        let mut report = BackfillReport::new();
        if rows.is_empty() {
            info!("nothing to backfill");
            return Ok(report);
        }

        let mut outcomes = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| async move {
                observer.on_row_start(index + 1, total, &row);
                let outcome = self.process_row(&row).await;
                (index, row, outcome)
            })
            .buffered(self.options.concurrency.max(1));

        while let Some((index, row, outcome)) = outcomes.next().await {
            observer.on_row(index + 1, total, &row, &outcome);
            report.record(outcome);
        }

        info!(
            attempted = report.attempted(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "backfill finished"
        );
        Ok(report)
    }

    async fn process_row(&self, row: &Row) -> RowOutcome {
        match self.embed_and_write(row).await {
            Ok(dimension) => RowOutcome::Succeeded {
                row_id: row.id.clone(),
                dimension,
            },
            Err(err) => {
                let kind = match err {
                    BackfillError::Write(_) => FailureKind::Write,
                    _ => FailureKind::Embedding,
                };
                warn!(row_id = %row.id, error = %err, "row failed");
                RowOutcome::Failed(RowFailure {
                    row_id: row.id.clone(),
                    kind,
                    message: err.to_string(),
                })
            }
        }
    }

    async fn embed_and_write(&self, row: &Row) -> BackfillResult<usize> {
        if row.text.trim().is_empty() {
            return Err(BackfillError::Embedding("row has no text to embed".to_string()));
        }

        let vector = self
            .provider
            .embed(&row.text)
            .await
            .map_err(into_embedding_error)?;
        self.check_dimension(&vector)?;
        let dimension = vector.len();

        let mut fields = RowPatch::new();
        fields.insert(
            self.options.field.clone(),
            Value::Array(vector.into_iter().map(Value::from).collect()),
        );

        let ack = self
            .store
            .patch(&row.id, &fields)
            .await
            .map_err(into_write_error)?;
        if !ack.is_success() {
            return Err(BackfillError::Write(format!(
                "store acknowledged no rows for id {}",
                row.id
            )));
        }

        Ok(dimension)
    }

    fn check_dimension(&self, vector: &[f32]) -> BackfillResult<()> {
        if vector.is_empty() {
            return Err(BackfillError::Embedding("provider returned an empty vector".to_string()));
        }
        match self.options.expected_dimension {
            Some(expected) if expected != vector.len() => Err(BackfillError::Embedding(format!(
                "dimension mismatch: got {} expected {expected}",
                vector.len()
            ))),
            _ => Ok(()),
        }
    }
}

fn into_embedding_error(err: BackfillError) -> BackfillError {
    match err {
        BackfillError::Embedding(_) => err,
        other => BackfillError::Embedding(other.to_string()),
    }
}

fn into_write_error(err: BackfillError) -> BackfillError {
    match err {
        BackfillError::Write(_) => err,
        other => BackfillError::Write(other.to_string()),
    }
}

fn into_unexpected(err: BackfillError) -> BackfillError {
    match err {
        BackfillError::Unexpected(_) | BackfillError::Configuration(_) => err,
        other => BackfillError::Unexpected(other.to_string()),
    }
}
