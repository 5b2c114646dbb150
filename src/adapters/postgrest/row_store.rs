//! PostgREST row store adapter.
//!
//! Speaks the REST surface Supabase exposes under `/rest/v1/{table}`.
//! Candidates are collected with keyset pagination on the id column so the
//! whole set is known before the first write. The server may cap a page
//! below the requested `limit` (`max-rows`), so only an empty page ends the
//! scan.

use async_trait::async_trait;
use reqwest::header::CONTENT_RANGE;
use reqwest::{Method, RequestBuilder, Response};
use serde_json::{Map, Value};
use std::time::Duration;

use crate::domain::errors::{BackfillError, BackfillResult};
use crate::domain::models::{Acknowledgement, FieldFilter, Row, StoreConfig};
use crate::domain::ports::{RowPatch, RowStore};

/// Connection and schema settings for a PostgREST table.
#[derive(Debug, Clone)]
pub struct PostgrestConfig {
    /// Project URL without the `/rest/v1` suffix.
    pub url: String,
    /// Service role key, sent as `apikey` and bearer token.
    pub api_key: String,
    /// Table name.
    pub table: String,
    /// Primary key column used for ordering and updates.
    pub id_column: String,
    /// Column holding the text to embed.
    pub text_column: String,
    /// Rows requested per page.
    pub page_size: usize,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl PostgrestConfig {
    /// Build from loaded configuration. URL and key must be set.
    pub fn from_config(config: &StoreConfig) -> BackfillResult<Self> {
        let url = required(config.url.as_deref(), "store.url (SUPABASE_URL)")?;
        let api_key = required(
            config.api_key.as_deref(),
            "store.api_key (SUPABASE_SERVICE_ROLE_KEY)",
        )?;

        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            table: config.table.clone(),
            id_column: config.id_column.clone(),
            text_column: config.text_column.clone(),
            page_size: config.page_size.max(1),
            timeout_secs: config.timeout_secs,
        })
    }
}

fn required<'a>(value: Option<&'a str>, name: &str) -> BackfillResult<&'a str> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BackfillError::Configuration(format!("{name} is not set")))
}

/// Row store backed by a PostgREST endpoint.
pub struct PostgrestRowStore {
    config: PostgrestConfig,
    client: reqwest::Client,
}

impl PostgrestRowStore {
    /// Create a store with its own HTTP client.
    pub fn new(config: PostgrestConfig) -> BackfillResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackfillError::Configuration(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.config.table)
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn fetch_page(&self, field: &str, after: Option<&str>) -> BackfillResult<Vec<Row>> {
        let id = &self.config.id_column;
        let mut query = vec![
            ("select".to_string(), format!("{id},{}", self.config.text_column)),
            (field.to_string(), "is.null".to_string()),
            ("order".to_string(), format!("{id}.asc")),
            ("limit".to_string(), self.config.page_size.to_string()),
        ];
        if let Some(last) = after {
            query.push((id.clone(), format!("gt.{last}")));
        }

        let response = self
            .request(Method::GET)
            .query(&query)
            .send()
            .await
            .map_err(|e| BackfillError::Unexpected(format!("Fetching rows failed: {e}")))?;
        let response = ensure_success(response, BackfillError::Unexpected).await?;

        let records: Vec<Map<String, Value>> = response
            .json()
            .await
            .map_err(|e| BackfillError::Unexpected(format!("Failed to parse rows: {e}")))?;

        records
            .into_iter()
            .map(|record| self.to_row(&record))
            .collect()
    }

    fn to_row(&self, record: &Map<String, Value>) -> BackfillResult<Row> {
        let id = match record.get(&self.config.id_column) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            other => {
                return Err(BackfillError::Unexpected(format!(
                    "Row without usable '{}' column: {other:?}",
                    self.config.id_column
                )))
            }
        };
        let text = record
            .get(&self.config.text_column)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(Row { id, text })
    }
}

async fn ensure_success(
    response: Response,
    to_error: fn(String) -> BackfillError,
) -> BackfillResult<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read response body".to_string());
    Err(to_error(format!("Row store returned {status}: {body}")))
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl RowStore for PostgrestRowStore {
    fn name(&self) -> &'static str {
        "postgrest"
    }

    #[tracing::instrument(skip(self), fields(table = %self.config.table))]
    async fn fetch_missing(&self, field: &str) -> BackfillResult<Vec<Row>> {
        let mut rows: Vec<Row> = Vec::new();
        loop {
            let after = rows.last().map(|row| row.id.clone());
            let page = self.fetch_page(field, after.as_deref()).await?;
            if page.is_empty() {
                break;
            }
            rows.extend(page);
            tracing::debug!(total = rows.len(), "fetched page");
        }
        Ok(rows)
    }

    #[tracing::instrument(skip(self, fields), fields(table = %self.config.table))]
    async fn patch(&self, id: &str, fields: &RowPatch) -> BackfillResult<Acknowledgement> {
        let id_column = &self.config.id_column;
        let response = self
            .request(Method::PATCH)
            .query(&[
                (id_column.as_str(), format!("eq.{id}")),
                ("select", id_column.clone()),
            ])
            .header("Prefer", "return=representation")
            .json(fields)
            .send()
            .await
            .map_err(|e| BackfillError::Write(format!("Update request failed: {e}")))?;
        let response = ensure_success(response, BackfillError::Write).await?;

        let updated: Vec<Value> = response
            .json()
            .await
            .map_err(|e| BackfillError::Write(format!("Failed to parse update response: {e}")))?;
        Ok(Acknowledgement::new(updated.len() as u64))
    }

    async fn count(&self, filter: FieldFilter<'_>) -> BackfillResult<u64> {
        let mut query = vec![("select".to_string(), self.config.id_column.clone())];
        match filter {
            FieldFilter::All => {}
            FieldFilter::Set(field) => query.push((field.to_string(), "not.is.null".to_string())),
            FieldFilter::Unset(field) => query.push((field.to_string(), "is.null".to_string())),
        }

        let response = self
            .request(Method::HEAD)
            .query(&query)
            .header("Prefer", "count=exact")
            .send()
            .await
            .map_err(|e| BackfillError::Unexpected(format!("Count request failed: {e}")))?;
        let response = ensure_success(response, BackfillError::Unexpected).await?;

        response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| {
                BackfillError::Unexpected("Count response missing Content-Range total".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_config_requires_url_and_key() {
        let mut store = StoreConfig::default();
        let err = PostgrestConfig::from_config(&store).unwrap_err();
        assert!(err.to_string().contains("store.url"));

        store.url = Some("https://example.supabase.co/".to_string());
        let err = PostgrestConfig::from_config(&store).unwrap_err();
        assert!(err.to_string().contains("store.api_key"));

        store.api_key = Some("service-key".to_string());
        let config = PostgrestConfig::from_config(&store).unwrap();
        assert_eq!(config.url, "https://example.supabase.co");
        assert_eq!(config.table, "questions");
    }

    #[test]
    fn test_to_row_accepts_numeric_ids() {
        let store = PostgrestRowStore::new(PostgrestConfig {
            url: "http://localhost".to_string(),
            api_key: "k".to_string(),
            table: "questions".to_string(),
            id_column: "id".to_string(),
            text_column: "question_text".to_string(),
            page_size: 10,
            timeout_secs: 5,
        })
        .unwrap();

        let record = serde_json::json!({"id": 42, "question_text": "Capital of France?"});
        let row = store.to_row(record.as_object().unwrap()).unwrap();
        assert_eq!(row, Row::new("42", "Capital of France?"));

        let missing_id = serde_json::json!({"question_text": "orphan"});
        assert!(store.to_row(missing_id.as_object().unwrap()).is_err());
    }
}
