//! `status`: embedding coverage of the table.

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::postgrest::{PostgrestConfig, PostgrestRowStore};
use crate::cli::output::{output, StatusOutput};
use crate::domain::models::Config;
use crate::services::StatusService;

/// Handle the status command
pub async fn execute(config: &Config, json: bool) -> Result<()> {
    let store = PostgrestRowStore::new(
        PostgrestConfig::from_config(&config.store).context("Invalid row store configuration")?,
    )?;

    let field = &config.store.embedding_column;
    let status = StatusService::new(Arc::new(store))
        .status(field)
        .await
        .context("Failed to read embedding status")?;

    output(
        &StatusOutput {
            table: config.store.table.clone(),
            field: field.clone(),
            status,
        },
        json,
    );
    Ok(())
}
