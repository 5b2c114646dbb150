//! `run`: backfill missing embeddings.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::embeddings::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::postgrest::{PostgrestConfig, PostgrestRowStore};
use crate::cli::output::{output, ConsoleProgress, RunOutput};
use crate::domain::models::Config;
use crate::domain::ports::EmbeddingProvider;
use crate::services::{BackfillOptions, BackfillService};

/// Handle the backfill run (the default command)
pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let provider = Arc::new(OpenAiEmbeddingProvider::new(
        OpenAiEmbeddingConfig::from_config(&config.embedding)
            .context("Invalid embedding configuration")?,
    )?);
    let store = PostgrestRowStore::new(
        PostgrestConfig::from_config(&config.store).context("Invalid row store configuration")?,
    )?;

    let options = BackfillOptions {
        field: config.store.embedding_column.clone(),
        concurrency: config.backfill.concurrency,
        max_rows: config.backfill.max_rows,
        expected_dimension: Some(provider.dimension()),
    };
    let service = BackfillService::new(provider, Arc::new(store)).with_options(options);

    let report = service
        .run(&ConsoleProgress::new(json))
        .await
        .context("Backfill aborted")?;

    output(&RunOutput::new(&config.store.embedding_column, report), json);
    Ok(())
}
