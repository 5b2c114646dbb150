//! Rows of the table being enriched.

use serde::{Deserialize, Serialize};

/// A candidate row: its identifier and the text to embed.
///
/// The embedding column itself is never read back; a row is only ever
/// fetched while that column is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// Primary key, as text.
    pub id: String,
    /// Source text for the embedding.
    pub text: String,
}

impl Row {
    /// Build a row from an id and its text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Filter used when counting rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFilter<'a> {
    /// Every row in the table.
    All,
    /// Rows where the field is set.
    Set(&'a str),
    /// Rows where the field is unset.
    Unset(&'a str),
}

/// Acknowledgement returned by a row store after a patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Acknowledgement {
    /// Number of rows the store reports as written.
    pub rows_affected: u64,
}

impl Acknowledgement {
    /// Acknowledgement for `rows_affected` written rows.
    pub const fn new(rows_affected: u64) -> Self {
        Self { rows_affected }
    }

    /// A write only counts when it actually touched a row.
    pub const fn is_success(&self) -> bool {
        self.rows_affected > 0
    }
}
