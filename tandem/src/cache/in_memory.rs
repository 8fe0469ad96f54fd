//! In-memory citation cache for tests and ephemeral sessions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheError, CachedSource, CitationCache};

/// In-memory citation cache. Same key discipline as the SQLite store:
/// one record per `(session_id, url)`, upsert refreshes content fields.
#[derive(Default)]
pub struct InMemoryCitationCache {
    records: RwLock<HashMap<(String, String), CachedSource>>,
}

impl InMemoryCitationCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CitationCache for InMemoryCitationCache {
    async fn upsert(&self, record: CachedSource) -> Result<(), CacheError> {
        let key = (record.session_id.clone(), record.url.clone());
        let mut records = self.records.write().await;
        match records.get_mut(&key) {
            Some(existing) => {
                existing.content = record.content;
                existing.raw_content = record.raw_content;
                existing.score = record.score;
                existing.timestamp = record.timestamp;
            }
            None => {
                records.insert(key, record);
            }
        }
        Ok(())
    }

    async fn get(&self, session_id: &str, url: &str) -> Result<Option<CachedSource>, CacheError> {
        let records = self.records.read().await;
        Ok(records
            .get(&(session_id.to_string(), url.to_string()))
            .cloned())
    }

    async fn list_urls(&self, session_id: &str) -> Result<Vec<String>, CacheError> {
        let records = self.records.read().await;
        let mut urls: Vec<String> = records
            .values()
            .filter(|r| r.session_id == session_id)
            .map(|r| r.url.clone())
            .collect();
        urls.sort();
        Ok(urls)
    }
}
