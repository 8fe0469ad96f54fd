//! Web search: provider abstraction, Tavily client, and the `search_cached`
//! tool that upserts every result into the session's citation cache.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, warn};

use crate::cache::{CachedSource, CitationCache};

use super::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// Tool name for cached search.
pub const TOOL_SEARCH_CACHED: &str = "search_cached";

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
/// Per-call timeout for one provider request.
const SEARCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);
/// Bounded retry on provider failure: attempts and base backoff.
const SEARCH_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: std::time::Duration = std::time::Duration::from_millis(250);

fn tavily_search_url() -> String {
    std::env::var("TAVILY_SEARCH_URL").unwrap_or_else(|_| TAVILY_SEARCH_URL.to_string())
}

/// Search depth requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

impl SearchDepth {
    fn as_str(&self) -> &'static str {
        match self {
            SearchDepth::Basic => "basic",
            SearchDepth::Advanced => "advanced",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "advanced" => SearchDepth::Advanced,
            _ => SearchDepth::Basic,
        }
    }
}

/// One result from the search provider.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub url: String,
    pub title: String,
    pub content: String,
    pub raw_content: String,
    pub score: f64,
    pub published_date: Option<String>,
}

/// Search provider: query in, scored results out.
///
/// Implementations: [`TavilySearch`] (HTTP) and [`MockSearchProvider`]
/// (tests, evaluation without network).
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
    ) -> Result<Vec<SearchResult>, ToolSourceError>;
}

/// Tavily search client with bounded retry and per-call timeout.
pub struct TavilySearch {
    api_key: String,
    client: reqwest::Client,
    max_results: u32,
}

impl TavilySearch {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    async fn search_once(
        &self,
        query: &str,
        depth: SearchDepth,
    ) -> Result<Vec<SearchResult>, ToolSourceError> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": depth.as_str(),
            "include_raw_content": true,
            "max_results": self.max_results,
        });
        let send = self.client.post(tavily_search_url()).json(&body).send();
        let res = tokio::time::timeout(SEARCH_TIMEOUT, send)
            .await
            .map_err(|_| ToolSourceError::Transport("search timed out".to_string()))?
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let err_body = res.text().await.unwrap_or_default();
            return Err(ToolSourceError::Transport(format!(
                "Tavily API error {}: {}",
                status, err_body
            )));
        }
        let out: serde_json::Value = res
            .json()
            .await
            .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        let results = out
            .get("results")
            .and_then(|r| r.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|r| {
                        Some(SearchResult {
                            url: r.get("url")?.as_str()?.to_string(),
                            title: r
                                .get("title")
                                .and_then(|t| t.as_str())
                                .unwrap_or("(no title)")
                                .to_string(),
                            content: r
                                .get("content")
                                .and_then(|c| c.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            raw_content: r
                                .get("raw_content")
                                .and_then(|c| c.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            score: r.get("score").and_then(|s| s.as_f64()).unwrap_or(0.0),
                            published_date: r
                                .get("published_date")
                                .and_then(|d| d.as_str())
                                .map(String::from),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(results)
    }
}

#[async_trait]
impl SearchProvider for TavilySearch {
    async fn search(
        &self,
        query: &str,
        depth: SearchDepth,
    ) -> Result<Vec<SearchResult>, ToolSourceError> {
        let mut attempt = 0u32;
        loop {
            match self.search_once(query, depth).await {
                Ok(results) => return Ok(results),
                Err(e) if attempt + 1 < SEARCH_RETRIES => {
                    let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                    warn!(attempt, error = %e, "search attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Scripted search provider for tests and offline evaluation.
#[derive(Default)]
pub struct MockSearchProvider {
    results: Vec<SearchResult>,
}

impl MockSearchProvider {
    pub fn new(results: Vec<SearchResult>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(
        &self,
        _query: &str,
        _depth: SearchDepth,
    ) -> Result<Vec<SearchResult>, ToolSourceError> {
        Ok(self.results.clone())
    }
}

/// `search_cached`: provider search whose results are upserted into the
/// session's citation cache before being returned to the agent. Callable only
/// from worker agents; the supervisor registry rejects it at startup.
pub struct SearchCachedTool {
    provider: Arc<dyn SearchProvider>,
    cache: Arc<dyn CitationCache>,
}

impl SearchCachedTool {
    pub fn new(provider: Arc<dyn SearchProvider>, cache: Arc<dyn CitationCache>) -> Self {
        Self { provider, cache }
    }

    fn format_results(results: &[SearchResult]) -> String {
        let mut s = String::new();
        for (i, r) in results.iter().enumerate() {
            s.push_str(&format!("[{}] {}\n  URL: {}\n", i + 1, r.title, r.url));
            if let Some(ref date) = r.published_date {
                s.push_str(&format!("  Published: {}\n", date));
            }
            let excerpt: String = r.content.chars().take(600).collect();
            if !excerpt.is_empty() {
                s.push_str(&format!("  {}\n", excerpt.replace('\n', " ")));
            }
            s.push('\n');
        }
        if s.is_empty() {
            s = "No results.".to_string();
        }
        s
    }
}

#[async_trait]
impl Tool for SearchCachedTool {
    fn name(&self) -> &str {
        TOOL_SEARCH_CACHED
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_SEARCH_CACHED.to_string(),
            description: Some(
                "Search the web and cache every result for citation verification. \
                 Quotes in your report must come verbatim from these cached results."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Search query" },
                    "depth": { "type": "string", "enum": ["basic", "advanced"] }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let query = required_str(&args, "query")?;
        let depth = args
            .get("depth")
            .and_then(|d| d.as_str())
            .map(SearchDepth::parse)
            .unwrap_or_default();

        let results = self.provider.search(query, depth).await?;
        debug!(
            session_id = %ctx.session_id,
            query,
            count = results.len(),
            "search results cached"
        );
        let timestamp = chrono::Utc::now().to_rfc3339();
        for r in &results {
            self.cache
                .upsert(CachedSource {
                    session_id: ctx.session_id.clone(),
                    url: r.url.clone(),
                    query: query.to_string(),
                    title: r.title.clone(),
                    content: r.content.clone(),
                    raw_content: r.raw_content.clone(),
                    score: r.score,
                    published_date: r.published_date.clone(),
                    timestamp: timestamp.clone(),
                })
                .await
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?;
        }

        Ok(ToolCallContent {
            text: format!(
                "{} results cached for this session.\n\n{}",
                results.len(),
                Self::format_results(&results)
            ),
        })
    }
}
