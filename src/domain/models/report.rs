//! Outcome of a backfill run.

use serde::Serialize;

/// Why a row ended up failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The provider call failed or returned an unusable vector.
    Embedding,
    /// The store rejected the update or acknowledged no rows.
    Write,
}

/// A single failed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    /// Id of the row that failed.
    pub row_id: String,
    /// Which step failed.
    pub kind: FailureKind,
    /// Diagnostic from the failing step.
    pub message: String,
}

/// Per-row outcome produced by the job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// Vector written to the row.
    Succeeded {
        /// Id of the updated row.
        row_id: String,
        /// Length of the written vector.
        dimension: usize,
    },
    /// Row left unset.
    Failed(RowFailure),
}

/// Final tally of a run.
///
/// `attempted` always equals `succeeded + failed`; the counters are only
/// moved through [`BackfillReport::record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    attempted: usize,
    succeeded: usize,
    failed: usize,
    failures: Vec<RowFailure>,
}

impl BackfillReport {
    /// Empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one finished row.
    pub fn record(&mut self, outcome: RowOutcome) {
        self.attempted += 1;
        match outcome {
            RowOutcome::Succeeded { .. } => self.succeeded += 1,
            RowOutcome::Failed(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
    }

    /// Rows attempted this run.
    pub const fn attempted(&self) -> usize {
        self.attempted
    }

    /// Rows written successfully.
    pub const fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Rows that failed and stay eligible for the next run.
    pub const fn failed(&self) -> usize {
        self.failed
    }

    /// Failed rows, in fetch order.
    pub fn failures(&self) -> &[RowFailure] {
        &self.failures
    }

    /// True when there was nothing to backfill.
    pub const fn is_empty(&self) -> bool {
        self.attempted == 0
    }

    /// Percentage of attempted rows that succeeded, `None` if nothing ran.
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> Option<f64> {
        if self.attempted == 0 {
            return None;
        }
        Some(self.succeeded as f64 / self.attempted as f64 * 100.0)
    }
}

/// Row counts for the status command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EmbeddingStatus {
    /// Rows in the table.
    pub total: u64,
    /// Rows with the field set.
    pub embedded: u64,
    /// Rows with the field unset.
    pub missing: u64,
}
