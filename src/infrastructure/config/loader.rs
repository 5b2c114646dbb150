//! Configuration loading and validation.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Default project config file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "backfill.yaml";

/// Prefix for environment overrides, e.g. `BACKFILL_STORE__TABLE`.
pub const ENV_PREFIX: &str = "BACKFILL_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No row store URL.
    #[error("Row store URL is not set. Set SUPABASE_URL or BACKFILL_STORE__URL")]
    MissingStoreUrl,

    /// No row store key.
    #[error("Row store key is not set. Set SUPABASE_SERVICE_ROLE_KEY or BACKFILL_STORE__API_KEY")]
    MissingStoreKey,

    /// No embedding key; carries the provider variable name.
    #[error("Embedding API key is not set. Set {0} or BACKFILL_EMBEDDING__API_KEY")]
    MissingEmbeddingKey(&'static str),

    /// A table or column name is blank.
    #[error("{0} cannot be empty")]
    EmptyName(&'static str),

    /// Concurrency below 1.
    #[error("Invalid concurrency: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    /// Page size below 1.
    #[error("Invalid page_size: {0}. Must be at least 1")]
    InvalidPageSize(usize),

    /// Dimension below 1.
    #[error("Invalid dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    /// Zero timeout.
    #[error("Invalid timeout for {0}: must be at least 1 second")]
    InvalidTimeout(&'static str),

    /// Unknown log level.
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    /// Unknown log format.
    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `backfill.yaml` in the working directory, or `path` when given
    /// 3. Conventional credential variables (`NEXT_PUBLIC_SUPABASE_URL`,
    ///    `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`)
    /// 4. Environment variables (`BACKFILL_*` prefix, `__` for nesting)
    ///
    /// The embedding key falls back to `OPENAI_API_KEY` or `MISTRAL_API_KEY`
    /// depending on the selected provider.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: Config = Self::figment(file)
            .extract()
            .context(format!("Failed to load configuration ({})", file.display()))?;
        let config = Self::apply_provider_key(config);

        Self::validate(&config)?;
        Ok(config)
    }

    fn figment(file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(file))
            .merge(
                Env::raw()
                    .only(&["NEXT_PUBLIC_SUPABASE_URL"])
                    .map(|_| "store.url".into()),
            )
            .merge(Env::raw().only(&["SUPABASE_URL"]).map(|_| "store.url".into()))
            .merge(
                Env::raw()
                    .only(&["SUPABASE_SERVICE_ROLE_KEY"])
                    .map(|_| "store.api_key".into()),
            )
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn apply_provider_key(mut config: Config) -> Config {
        if is_blank(config.embedding.api_key.as_deref()) {
            config.embedding.api_key = std::env::var(config.embedding.provider.api_key_env()).ok();
        }
        config
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if is_blank(config.store.url.as_deref()) {
            return Err(ConfigError::MissingStoreUrl);
        }
        if is_blank(config.store.api_key.as_deref()) {
            return Err(ConfigError::MissingStoreKey);
        }
        if is_blank(config.embedding.api_key.as_deref()) {
            return Err(ConfigError::MissingEmbeddingKey(
                config.embedding.provider.api_key_env(),
            ));
        }

        let names = [
            ("store.table", &config.store.table),
            ("store.id_column", &config.store.id_column),
            ("store.text_column", &config.store.text_column),
            ("store.embedding_column", &config.store.embedding_column),
        ];
        for (name, value) in names {
            if value.trim().is_empty() {
                return Err(ConfigError::EmptyName(name));
            }
        }

        if config.backfill.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(config.backfill.concurrency));
        }
        if config.store.page_size == 0 {
            return Err(ConfigError::InvalidPageSize(config.store.page_size));
        }
        if config.embedding.dimension == Some(0) {
            return Err(ConfigError::InvalidDimension(0));
        }
        if config.embedding.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("embedding"));
        }
        if config.store.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("store"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}
