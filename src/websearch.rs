//! Web search fallback: external search results folded into a single
//! synthetic evidence document.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::WebSearchConfig;
use crate::models::Document;

/// Content of the placeholder document emitted when search fails. The
/// pipeline proceeds degraded rather than aborting the run.
pub const SEARCH_FAILED_PLACEHOLDER: &str = "Web search failed.";

#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Search the web and return one synthetic document with empty
    /// metadata. Never raises; failures yield a placeholder document.
    async fn search(&self, query: &str) -> Document;
}

/// Tavily-compatible web search client.
pub struct TavilySearcher {
    http: reqwest::Client,
    config: WebSearchConfig,
}

impl TavilySearcher {
    pub fn new(http: reqwest::Client, config: WebSearchConfig) -> Self {
        Self { http, config }
    }

    async fn search_inner(&self, query: &str) -> Result<Document> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .context("Web search API key not configured")?;

        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));

        let req = TavilyRequest {
            api_key: api_key.to_string(),
            query: query.to_string(),
            max_results: self.config.max_results,
        };

        let resp = self
            .http
            .post(&url)
            .json(&req)
            .send()
            .await
            .context("Failed to call web search API")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Web search API returned {status}: {body}");
        }

        let body: TavilyResponse = resp
            .json()
            .await
            .context("Failed to parse web search response")?;

        let content = body
            .results
            .iter()
            .take(self.config.max_results)
            .map(|r| r.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Document::new(content))
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str) -> Document {
        match self.search_inner(query).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!("Web search failed, returning placeholder: {e}");
                Document::new(SEARCH_FAILED_PLACEHOLDER)
            }
        }
    }
}

#[derive(Serialize)]
struct TavilyRequest {
    api_key: String,
    query: String,
    max_results: usize,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    content: String,
}
