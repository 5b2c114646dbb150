//! In-memory row store.
//!
//! Holds rows in process. Used by the test suite and handy for exercising
//! the job without a live table.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::domain::errors::{BackfillError, BackfillResult};
use crate::domain::models::{Acknowledgement, FieldFilter, Row};
use crate::domain::ports::{RowPatch, RowStore};

#[derive(Debug, Clone)]
struct StoredRow {
    id: String,
    text: String,
    fields: Map<String, Value>,
}

impl StoredRow {
    fn is_set(&self, field: &str) -> bool {
        self.fields.get(field).is_some_and(|v| !v.is_null())
    }
}

/// Row store kept in memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryRowStore {
    rows: RwLock<Vec<StoredRow>>,
    rejected_ids: RwLock<HashSet<String>>,
    ignored_ids: RwLock<HashSet<String>>,
    patch_calls: RwLock<usize>,
}

impl InMemoryRowStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row with the given text and no other fields.
    pub async fn insert(&self, id: impl Into<String>, text: impl Into<String>) {
        self.rows.write().await.push(StoredRow {
            id: id.into(),
            text: text.into(),
            fields: Map::new(),
        });
    }

    /// Add a row with `field` already populated.
    pub async fn insert_with(
        &self,
        id: impl Into<String>,
        text: impl Into<String>,
        field: &str,
        value: Value,
    ) {
        let mut fields = Map::new();
        fields.insert(field.to_string(), value);
        self.rows.write().await.push(StoredRow {
            id: id.into(),
            text: text.into(),
            fields,
        });
    }

    /// Make every patch of `id` fail with a write error.
    pub async fn reject_writes_for(&self, id: impl Into<String>) {
        self.rejected_ids.write().await.insert(id.into());
    }

    /// Make every patch of `id` succeed at the transport level but touch no
    /// rows, like a filter that matched nothing.
    pub async fn acknowledge_nothing_for(&self, id: impl Into<String>) {
        self.ignored_ids.write().await.insert(id.into());
    }

    /// Current value of `field` on row `id`.
    pub async fn field(&self, id: &str, field: &str) -> Option<Value> {
        self.rows
            .read()
            .await
            .iter()
            .find(|row| row.id == id)
            .and_then(|row| row.fields.get(field).cloned())
    }

    /// Number of patch calls received, including rejected ones.
    pub async fn patch_calls(&self) -> usize {
        *self.patch_calls.read().await
    }
}

#[async_trait]
impl RowStore for InMemoryRowStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_missing(&self, field: &str) -> BackfillResult<Vec<Row>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|row| !row.is_set(field))
            .map(|row| Row::new(row.id.clone(), row.text.clone()))
            .collect())
    }

    async fn patch(&self, id: &str, fields: &RowPatch) -> BackfillResult<Acknowledgement> {
        *self.patch_calls.write().await += 1;

        if self.rejected_ids.read().await.contains(id) {
            return Err(BackfillError::Write(format!("write rejected for row {id}")));
        }
        if self.ignored_ids.read().await.contains(id) {
            return Ok(Acknowledgement::new(0));
        }

        let mut rows = self.rows.write().await;
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Ok(Acknowledgement::new(0));
        };
        for (key, value) in fields {
            row.fields.insert(key.clone(), value.clone());
        }
        Ok(Acknowledgement::new(1))
    }

    async fn count(&self, filter: FieldFilter<'_>) -> BackfillResult<u64> {
        let rows = self.rows.read().await;
        let count = match filter {
            FieldFilter::All => rows.len(),
            FieldFilter::Set(field) => rows.iter().filter(|row| row.is_set(field)).count(),
            FieldFilter::Unset(field) => rows.iter().filter(|row| !row.is_set(field)).count(),
        };
        Ok(count as u64)
    }
}
