//! Web search tool backed by the Serper.dev Google Search API.
//!
//! Every outcome of a web search is a string the model can reason over:
//! results become a newline digest, an empty result set becomes a "no
//! results" sentence, and provider failures become an error sentence with a
//! recognizable prefix. The tool itself never fails the query.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::error::{AgentError, Result};
use crate::events::ArtifactStatus;
use crate::tool::{ParamExt, Tool, ToolContext, ToolResult};

/// Default Serper API endpoint.
pub const DEFAULT_SERPER_BASE_URL: &str = "https://google.serper.dev";

/// Prefix shared by every web-search failure string.
pub const WEB_ERROR_PREFIX: &str = "Web search error:";

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from the search provider.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No API key was configured.
    #[error("SERPER_API_KEY is not configured")]
    MissingApiKey,

    /// The provider rejected the API key.
    #[error("the search provider rejected the API key (HTTP {0})")]
    Auth(StatusCode),

    /// The provider is down or overloaded.
    #[error("the search provider is unavailable (HTTP {0})")]
    Unavailable(StatusCode),

    /// The provider could not be reached.
    #[error("could not reach the search provider: {0}")]
    Network(String),

    /// Anything else.
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            SearchError::Network(err.to_string())
        } else {
            SearchError::Unexpected(err.to_string())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Serper client
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration for the Serper client.
#[derive(Debug, Clone)]
pub struct SerperConfig {
    /// API key. `None` means web search is unavailable.
    pub api_key: Option<String>,
    /// Base URL of the Serper API.
    pub base_url: String,
    /// Maximum number of organic results to request and keep.
    pub max_results: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for SerperConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_SERPER_BASE_URL.to_string(),
            max_results: 5,
            timeout: Duration::from_secs(10),
        }
    }
}

impl SerperConfig {
    /// Config with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Config with the API key taken from `SERPER_API_KEY`.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("SERPER_API_KEY").ok(),
            ..Self::default()
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the result cap.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One organic search result.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchResult {
    /// Page title.
    #[serde(default)]
    pub title: String,
    /// Page URL.
    #[serde(default)]
    pub link: String,
    /// Short text excerpt.
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

/// HTTP client for the Serper.dev search API.
#[derive(Debug, Clone)]
pub struct SerperClient {
    client: Client,
    config: SerperConfig,
}

impl SerperClient {
    /// Create a client from configuration.
    pub fn new(config: SerperConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AgentError::config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }

    /// Top organic results for the query, capped at `max_results`.
    pub async fn search(
        &self,
        query: &str,
    ) -> std::result::Result<Vec<SearchResult>, SearchError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or(SearchError::MissingApiKey)?;

        tracing::debug!(url = %self.search_url(), query, "Sending Serper search request");

        let response = self
            .client
            .post(self.search_url())
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": query, "num": self.config.max_results }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SearchError::Auth(status));
        }
        if status.is_server_error() {
            return Err(SearchError::Unavailable(status));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Unexpected(format!("HTTP {status}: {body}")));
        }

        let parsed: SerperResponse = response.json().await?;
        let mut results = parsed.organic;
        results.truncate(self.config.max_results);
        Ok(results)
    }
}

/// Render results as the newline digest handed back to the model.
pub fn digest(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No Google search results found for '{query}'.");
    }

    let mut blocks = Vec::with_capacity(results.len() + 1);
    blocks.push("Google Search Results:".to_string());
    for result in results {
        blocks.push(format!(
            "Title: {}\nLink: {}\nSnippet: {}",
            result.title, result.link, result.snippet
        ));
    }
    blocks.join("\n\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool
// ─────────────────────────────────────────────────────────────────────────────

/// Web search over the public internet.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    client: SerperClient,
}

impl WebSearchTool {
    /// Create the tool around a Serper client.
    pub fn new(client: SerperClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the web with Google and return the top results as text. Use this when \
         the local database has no matching records."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The web search query"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: serde_json::Value, ctx: &ToolContext) -> Result<ToolResult> {
        let query = match params.required_str("query", "provide the web search query") {
            Ok(query) => query,
            Err(e) => return Ok(ToolResult::error(e.to_string())),
        };

        let content = match self.client.search(query).await {
            Ok(results) => {
                tracing::debug!(
                    query_id = %ctx.query_id,
                    query,
                    results = results.len(),
                    "Web search complete"
                );
                digest(query, &results)
            }
            Err(e) => {
                tracing::warn!(query_id = %ctx.query_id, query, error = %e, "Web search failed");
                format!("{WEB_ERROR_PREFIX} {e}")
            }
        };

        Ok(ToolResult::text(content))
    }

    // Failures travel as text so the model sees them; classify by prefix.
    fn artifact_status(&self, result: &ToolResult) -> ArtifactStatus {
        match result {
            ToolResult::Text { content } if content.starts_with(WEB_ERROR_PREFIX) => {
                ArtifactStatus::Fail
            }
            ToolResult::Error { .. } => ArtifactStatus::Fail,
            _ => ArtifactStatus::Success,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
