//! Citation cache: session-scoped, upsert-on-URL store of search results.
//!
//! Keys are `(session_id, url)`. Upserts refresh `content`, `raw_content`,
//! `score`, and `timestamp`; stored text keeps its original case. Substring
//! queries collapse whitespace and fold case at match time only.
//!
//! Implementations: [`SqliteCitationCache`] (transactional, durable) and
//! [`InMemoryCitationCache`] (tests, ephemeral sessions).

mod in_memory;
mod sqlite;

pub use in_memory::InMemoryCitationCache;
pub use sqlite::SqliteCitationCache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::citation::normalize_for_match;

/// Error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

/// One cached search result for a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedSource {
    pub session_id: String,
    pub url: String,
    /// Query that produced this result.
    pub query: String,
    pub title: String,
    /// Cleaned page content. Original case preserved.
    pub content: String,
    /// Raw page content when the provider returns it. Original case preserved.
    pub raw_content: String,
    /// Provider relevance score.
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
    /// ISO timestamp of the last upsert.
    pub timestamp: String,
}

/// Session-scoped upsert store of search results keyed by URL.
///
/// Writes with the same `(session_id, url)` are serialized by the
/// implementation; readers never observe torn rows.
#[async_trait]
pub trait CitationCache: Send + Sync {
    /// Inserts or refreshes the record at `(record.session_id, record.url)`.
    /// Refresh updates `content`, `raw_content`, `score`, and `timestamp`.
    async fn upsert(&self, record: CachedSource) -> Result<(), CacheError>;

    /// Fetches the record at `(session_id, url)`.
    async fn get(&self, session_id: &str, url: &str) -> Result<Option<CachedSource>, CacheError>;

    /// Whitespace-collapsed, case-insensitive substring check of `quote`
    /// against both `content` and `raw_content` of the cached record.
    /// Absent records answer `false`.
    async fn contains_quote(
        &self,
        session_id: &str,
        url: &str,
        quote: &str,
    ) -> Result<bool, CacheError> {
        match self.get(session_id, url).await? {
            None => Ok(false),
            Some(record) => Ok(record.matches_quote(quote)),
        }
    }

    /// URLs cached for a session, for diagnostics and verification messages.
    async fn list_urls(&self, session_id: &str) -> Result<Vec<String>, CacheError>;
}

impl CachedSource {
    /// Substring-presence check used by citation verification. Case folding
    /// happens here, at query time; stored text keeps its case.
    pub fn matches_quote(&self, quote: &str) -> bool {
        let needle = normalize_for_match(quote);
        if needle.is_empty() {
            return false;
        }
        normalize_for_match(&self.content).contains(&needle)
            || normalize_for_match(&self.raw_content).contains(&needle)
    }
}
