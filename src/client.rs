//! HTTP client for the remote headlines API.
//!
//! One endpoint is consumed: `GET /top-headlines`. The service wraps both
//! success and failure in a JSON envelope keyed by `status`, so errors are
//! detected from the body first and the HTTP status code is only a fallback
//! for responses that carry no envelope at all.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::config::Config;

/// Fixed page length used against the remote API. Not user-configurable.
pub const PAGE_SIZE: usize = 5;

/// Errors that can occur while fetching a page of headlines.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// HTTP response with non-2xx status and no parseable error envelope
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// The service answered with `status: "error"`. Upstream detail is
    /// preserved so the user can tell an invalid key from a bad parameter.
    #[error("News API error ({code}): {message}")]
    Api { code: String, message: String },
    /// Response body was not a valid headlines envelope
    #[error("Malformed response: {0}")]
    Decode(String),
}

/// A single headline, projected from the raw API record.
///
/// Identity is the source `url` (not enforced — duplicate titles are
/// possible). Replaced wholesale on every successful fetch; string fields
/// use `Arc<str>` for cheap cloning into display code.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: Arc<str>,
    pub description: Option<Arc<str>>,
    pub author: Option<Arc<str>>,
    pub published_at: Option<DateTime<Utc>>,
    pub image: Option<Arc<str>>,
    pub url: Arc<str>,
}

/// Parameters for one page fetch, derived from controller state.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub category: String,
    pub query: String,
    pub page: u32,
}

impl PageRequest {
    /// Request-derived query parameters. Country and credential are
    /// client-level and appended separately by [`ApiClient`].
    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("category", self.category.clone()),
            ("q", self.query.clone()),
            ("page", self.page.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
        ]
    }
}

// ============================================================================
// Wire Types
// ============================================================================

/// Response envelope shared by success and error payloads.
///
/// Success: `{status: "ok", articles: [...]}`.
/// Failure: `{status: "error", code, message}`.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

/// Raw article record as sent by the API. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct RawArticle {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "urlToImage")]
    image: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// Project raw records into [`Article`], dropping records without a source
/// URL (the article's identity).
fn project_articles(raw: Vec<RawArticle>) -> Vec<Article> {
    let total = raw.len();
    let articles: Vec<Article> = raw
        .into_iter()
        .filter_map(|record| {
            let url = record.url?;
            Some(Article {
                title: Arc::from(record.title.unwrap_or_default()),
                description: record.description.map(Arc::from),
                author: record.author.map(Arc::from),
                published_at: record.published_at,
                image: record.image.map(Arc::from),
                url: Arc::from(url),
            })
        })
        .collect();

    let skipped = total - articles.len();
    if skipped > 0 {
        tracing::warn!(skipped, "Articles without a source URL dropped");
    }
    articles
}

// ============================================================================
// Client
// ============================================================================

/// Client for the remote headlines service.
///
/// Holds the endpoint, country, API key, and a pooled HTTP client. Cheap to
/// share via `Arc` across spawned fetch tasks.
pub struct ApiClient {
    http: reqwest::Client,
    endpoint: Url,
    country: String,
    api_key: SecretString,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from explicit configuration.
    ///
    /// Fails when no API key is configured (neither `HEADLINES_API_KEY` nor
    /// the `api_key` config entry) or the endpoint is not a valid URL.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            anyhow::anyhow!(
                "No API key configured. Set HEADLINES_API_KEY or add api_key to the config file."
            )
        })?;

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| anyhow::anyhow!("Invalid endpoint '{}': {}", config.endpoint, e))?;

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            country: config.country.clone(),
            api_key,
            timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    /// Fetch one page of top headlines.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] - request exceeded the configured timeout
    /// - [`FetchError::Network`] - connection or TLS failure
    /// - [`FetchError::Api`] - service answered `status: "error"`
    /// - [`FetchError::HttpStatus`] - non-2xx response without an envelope
    /// - [`FetchError::Decode`] - 2xx response that is not a valid envelope
    pub async fn top_headlines(&self, request: &PageRequest) -> Result<Vec<Article>, FetchError> {
        let url = format!(
            "{}/top-headlines",
            self.endpoint.as_str().trim_end_matches('/')
        );

        tracing::debug!(
            category = %request.category,
            query = %request.query,
            page = request.page,
            "Fetching headlines page"
        );

        let response = tokio::time::timeout(
            self.timeout,
            self.http
                .get(&url)
                .query(&request.query_params())
                .query(&[
                    ("country", self.country.as_str()),
                    ("apiKey", self.api_key.expose_secret()),
                ])
                .send(),
        )
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(FetchError::Network)?;

        // The error envelope usually rides on a 4xx status, so decode the
        // body before looking at the status code.
        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) if envelope.status == "ok" => Ok(project_articles(envelope.articles)),
            Ok(envelope) => Err(FetchError::Api {
                code: envelope.code.unwrap_or_else(|| "unknown".to_string()),
                message: envelope
                    .message
                    .unwrap_or_else(|| "no detail provided".to_string()),
            }),
            Err(_) if !status.is_success() => Err(FetchError::HttpStatus(status.as_u16())),
            Err(e) => Err(FetchError::Decode(e.to_string())),
        }
    }
}
