//! Configuration model.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration structure for the backfill
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Embedding provider configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Row store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Job behaviour
    #[serde(default)]
    pub backfill: BackfillConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Supported embedding APIs. Both speak the OpenAI `/embeddings` wire format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// OpenAI, `text-embedding-3-small` by default.
    #[default]
    OpenAi,
    /// Mistral, `mistral-embed` by default.
    Mistral,
}

impl EmbeddingProviderKind {
    /// Name used in logs and messages.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Mistral => "mistral",
        }
    }

    /// API root used when `base_url` is not configured.
    pub const fn default_base_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Mistral => "https://api.mistral.ai/v1",
        }
    }

    /// Model used when `model` is not configured.
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => "text-embedding-3-small",
            Self::Mistral => "mistral-embed",
        }
    }

    /// Vector length of the default model.
    pub const fn default_dimension(self) -> usize {
        match self {
            Self::OpenAi => 1536,
            Self::Mistral => 1024,
        }
    }

    /// Environment variable holding the credential when none is configured.
    pub const fn api_key_env(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Mistral => "MISTRAL_API_KEY",
        }
    }
}

/// Embedding provider configuration
///
/// `base_url`, `model` and `dimension` fall back to the provider's defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    /// Which API to call
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// API credential (required)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API root without `/embeddings`
    #[serde(default)]
    pub base_url: Option<String>,

    /// Model name
    #[serde(default)]
    pub model: Option<String>,

    /// Expected vector length; vectors of any other length are rejected
    #[serde(default)]
    pub dimension: Option<usize>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl EmbeddingConfig {
    /// Configured base URL or the provider default.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
    }

    /// Configured model or the provider default.
    pub fn model(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    /// Configured dimension or the provider default.
    pub fn dimension(&self) -> usize {
        self.dimension
            .unwrap_or_else(|| self.provider.default_dimension())
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            api_key: None,
            base_url: None,
            model: None,
            dimension: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_timeout_secs() -> u64 {
    30
}

/// Row store (PostgREST) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyz.supabase.co` (required)
    #[serde(default)]
    pub url: Option<String>,

    /// Service key used for both `apikey` and bearer auth (required)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_id_column")]
    pub id_column: String,

    #[serde(default = "default_text_column")]
    pub text_column: String,

    /// Column the vectors are written to; also the "missing" predicate
    #[serde(default = "default_embedding_column")]
    pub embedding_column: String,

    /// Rows requested per page while collecting candidates
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    "questions".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_text_column() -> String {
    "question_text".to_string()
}

fn default_embedding_column() -> String {
    "embedding".to_string()
}

const fn default_page_size() -> usize {
    1000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            table: default_table(),
            id_column: default_id_column(),
            text_column: default_text_column(),
            embedding_column: default_embedding_column(),
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Job behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackfillConfig {
    /// Rows in flight at once; 1 keeps the run strictly sequential
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Upper bound on rows attempted per run
    #[serde(default)]
    pub max_rows: Option<usize>,
}

const fn default_concurrency() -> usize {
    1
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_rows: None,
        }
    }
}

/// Log file rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    /// New file every day
    #[default]
    Daily,
    /// New file every hour
    Hourly,
    /// Single file
    Never,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for JSON log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}
