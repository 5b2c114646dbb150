//! Common test utilities for integration tests
//!
//! Provides a scripted embedding provider and row-store fixtures shared
//! across the integration test files.

#![allow(dead_code)]

use async_trait::async_trait;
use embedding_backfill::adapters::memory::InMemoryRowStore;
use embedding_backfill::{BackfillError, BackfillResult, EmbeddingProvider};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Embedding provider returning a fixed-length vector derived from the
/// text, failing for any text registered with [`ScriptedProvider::fail_on`].
pub struct ScriptedProvider {
    dimension: usize,
    failing_texts: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failing_texts: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_on(mut self, text: impl Into<String>) -> Self {
        self.failing_texts.insert(text.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> BackfillResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_texts.contains(text) {
            return Err(BackfillError::Embedding(format!("provider refused '{text}'")));
        }
        #[allow(clippy::cast_precision_loss)]
        let seed = text.len() as f32;
        Ok((0..self.dimension).map(|i| seed + i as f32 * 0.01).collect())
    }
}

/// Store pre-filled with `count` unembedded rows `row-0..row-{count-1}`,
/// whose text is `question {i}`.
pub async fn store_with_questions(count: usize) -> Arc<InMemoryRowStore> {
    let store = Arc::new(InMemoryRowStore::new());
    for i in 0..count {
        store.insert(format!("row-{i}"), format!("question {i}")).await;
    }
    store
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
