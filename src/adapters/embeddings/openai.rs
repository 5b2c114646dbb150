//! OpenAI-compatible embedding provider adapter.
//!
//! Talks to any `/embeddings` endpoint that follows the OpenAI wire format.
//! Mistral's `mistral-embed` is served the same way, so one adapter covers
//! both providers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::errors::{BackfillError, BackfillResult};
use crate::domain::models::{EmbeddingConfig, EmbeddingProviderKind};
use crate::domain::ports::EmbeddingProvider;

/// Configuration for the OpenAI-compatible embedding provider.
#[derive(Debug, Clone)]
pub struct OpenAiEmbeddingConfig {
    /// Provider the settings were resolved for.
    pub provider: EmbeddingProviderKind,
    /// Bearer credential.
    pub api_key: String,
    /// Base URL for the API, without the trailing `/embeddings`.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Expected embedding dimension.
    pub dimension: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl OpenAiEmbeddingConfig {
    /// Build from loaded configuration. The key must already be present.
    pub fn from_config(config: &EmbeddingConfig) -> BackfillResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                BackfillError::Configuration(format!(
                    "{} API key not set. Set {} or embedding.api_key.",
                    config.provider.as_str(),
                    config.provider.api_key_env()
                ))
            })?;

        Ok(Self {
            provider: config.provider,
            api_key,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            dimension: config.dimension(),
            timeout_secs: config.timeout_secs,
        })
    }
}

/// OpenAI-compatible embedding provider.
pub struct OpenAiEmbeddingProvider {
    config: OpenAiEmbeddingConfig,
    client: reqwest::Client,
}

impl OpenAiEmbeddingProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: OpenAiEmbeddingConfig) -> BackfillResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackfillError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    async fn call_embeddings_api(&self, text: &str) -> BackfillResult<Vec<f32>> {
        let url = format!("{}/embeddings", self.config.base_url);

        let request_body = EmbeddingsRequest {
            model: &self.config.model,
            input: [text],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| BackfillError::Embedding(format!("Embedding API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(BackfillError::Embedding(format!(
                "Embedding API returned {status}: {body}"
            )));
        }

        let result: EmbeddingsResponse = response.json().await.map_err(|e| {
            BackfillError::Embedding(format!("Failed to parse embedding response: {e}"))
        })?;

        result
            .data
            .into_iter()
            .min_by_key(|d| d.index)
            .map(|d| d.embedding)
            .ok_or_else(|| BackfillError::Embedding("Empty embedding response".to_string()))
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingProvider {
    fn name(&self) -> &'static str {
        self.config.provider.as_str()
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    #[tracing::instrument(skip_all, fields(provider = self.name(), model = %self.config.model))]
    async fn embed(&self, text: &str) -> BackfillResult<Vec<f32>> {
        let vector = self.call_embeddings_api(text).await?;
        tracing::debug!(dimension = vector.len(), "embedding received");
        Ok(vector)
    }
}

// -- OpenAI API request/response types --

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}
