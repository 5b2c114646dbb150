//! Embedding provider port for semantic vector generation.
//!
//! Defines the trait for embedding providers that convert text into
//! dense vector representations.

use async_trait::async_trait;

use crate::domain::errors::BackfillResult;

/// Trait for embedding providers.
///
/// One text per call; failures surface as [`BackfillError::Embedding`].
///
/// [`BackfillError::Embedding`]: crate::domain::errors::BackfillError::Embedding
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "mistral").
    fn name(&self) -> &'static str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> BackfillResult<Vec<f32>>;
}
