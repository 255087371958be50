use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::NewsConfig;

/// Number of articles requested from the provider per fetch
pub const PAGE_SIZE: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Category {
    #[default]
    Stocks,
    MutualFunds,
    Crypto,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Stocks, Category::MutualFunds, Category::Crypto];

    pub fn id(self) -> &'static str {
        match self {
            Category::Stocks => "stocks",
            Category::MutualFunds => "mutual-funds",
            Category::Crypto => "crypto",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Stocks => "Stocks",
            Category::MutualFunds => "Mutual Funds",
            Category::Crypto => "Crypto",
        }
    }

    /// The canned provider search query for this category
    pub fn query(self) -> &'static str {
        match self {
            Category::Stocks => "stock market OR stocks OR equity",
            Category::MutualFunds => "mutual funds OR investment funds",
            Category::Crypto => "cryptocurrency OR bitcoin OR ethereum",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == id)
    }

    /// Like `from_id`, but unknown or missing selectors fall back to stocks.
    pub fn resolve(id: Option<&str>) -> Self {
        id.and_then(Self::from_id).unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// The provider sends explicit `null` for fields it has no value for.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub published_at: String,
    pub source: Source,
}

/// Body returned by the provider's `everything` endpoint. Error bodies share
/// the `status` field and carry `code`/`message` instead of articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    pub status: String,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub articles: Vec<Article>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl NewsResponse {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("NEWS_API_KEY not configured")]
    Configuration,
    #[error("NewsAPI error: {status}")]
    Upstream { status: u16 },
    #[error("NewsAPI reported an error: {0}")]
    Provider(String),
    #[error("Unexpected NewsAPI response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("NewsAPI request failed: {0}")]
    Request(#[from] reqwest::Error),
}

pub struct NewsClient {
    client: Client,
    endpoint: String,
    language: String,
    api_key: Option<String>,
}

impl NewsClient {
    pub fn new(config: &NewsConfig, api_key: Option<String>) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("FinanceAssistant/1.0")
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            language: config.language.clone(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }

    /// Build a client whose credential comes from `NEWS_API_KEY`.
    pub fn from_env(config: &NewsConfig) -> Result<Self, NewsError> {
        Self::new(config, std::env::var("NEWS_API_KEY").ok())
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch the provider body for `category` without touching it.
    pub async fn fetch_raw(&self, category: Category) -> Result<Bytes, NewsError> {
        let api_key = self.api_key.as_deref().ok_or(NewsError::Configuration)?;

        info!(%category, "Fetching news");

        let page_size = PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", category.query()),
                ("sortBy", "publishedAt"),
                ("language", self.language.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%category, status = status.as_u16(), "News provider returned an error status");
            return Err(NewsError::Upstream {
                status: status.as_u16(),
            });
        }

        Ok(response.bytes().await?)
    }

    pub async fn fetch(&self, category: Category) -> Result<NewsResponse, NewsError> {
        let body = self.fetch_raw(category).await?;
        let response: NewsResponse = serde_json::from_slice(&body)?;

        if !response.is_ok() {
            let reason = response
                .message
                .clone()
                .unwrap_or_else(|| response.status.clone());
            return Err(NewsError::Provider(reason));
        }

        info!(%category, count = response.articles.len(), "Fetched news");
        Ok(response)
    }
}
