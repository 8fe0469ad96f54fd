//! SQLite-backed citation cache. Persistent across process restarts.
//!
//! One row per `(session_id, url)`; upserts run as a single
//! `INSERT .. ON CONFLICT DO UPDATE` statement so a crash never leaves a
//! partial refresh. Uses spawn_blocking for async.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params;

use super::{CacheError, CachedSource, CitationCache};

/// SQLite citation cache. Key: `(session_id, url)`.
///
/// **Interaction**: shared across sessions behind `Arc<dyn CitationCache>`;
/// namespacing is by `session_id` column, serialization of same-key writes by
/// SQLite's single-writer lock.
pub struct SqliteCitationCache {
    db_path: std::path::PathBuf,
}

impl SqliteCitationCache {
    /// Opens (creating if needed) the cache database and ensures the table.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CacheError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| CacheError::Storage(e.to_string()))?;
            }
        }
        let conn =
            rusqlite::Connection::open(&db_path).map_err(|e| CacheError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS cached_sources (
                session_id TEXT NOT NULL,
                url TEXT NOT NULL,
                query TEXT NOT NULL,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                raw_content TEXT NOT NULL,
                score REAL NOT NULL,
                published_date TEXT,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (session_id, url)
            )
            "#,
            [],
        )
        .map_err(|e| CacheError::Storage(e.to_string()))?;
        Ok(Self { db_path })
    }
}

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CachedSource> {
    Ok(CachedSource {
        session_id: row.get(0)?,
        url: row.get(1)?,
        query: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        raw_content: row.get(5)?,
        score: row.get(6)?,
        published_date: row.get(7)?,
        timestamp: row.get(8)?,
    })
}

#[async_trait]
impl CitationCache for SqliteCitationCache {
    async fn upsert(&self, record: CachedSource) -> Result<(), CacheError> {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            conn.execute(
                r#"
                INSERT INTO cached_sources
                (session_id, url, query, title, content, raw_content, score, published_date, timestamp)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ON CONFLICT (session_id, url) DO UPDATE SET
                    content = excluded.content,
                    raw_content = excluded.raw_content,
                    score = excluded.score,
                    timestamp = excluded.timestamp
                "#,
                params![
                    record.session_id,
                    record.url,
                    record.query,
                    record.title,
                    record.content,
                    record.raw_content,
                    record.score,
                    record.published_date,
                    record.timestamp,
                ],
            )
            .map_err(|e| CacheError::Storage(e.to_string()))?;
            Ok::<(), CacheError>(())
        })
        .await
        .map_err(|e| CacheError::Storage(e.to_string()))?
    }

    async fn get(&self, session_id: &str, url: &str) -> Result<Option<CachedSource>, CacheError> {
        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();
        let url = url.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT session_id, url, query, title, content, raw_content, score,
                            published_date, timestamp
                     FROM cached_sources WHERE session_id = ?1 AND url = ?2",
                )
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            let mut rows = stmt
                .query_map(params![session_id, url], row_to_record)
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            match rows.next() {
                Some(r) => Ok(Some(r.map_err(|e| CacheError::Storage(e.to_string()))?)),
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| CacheError::Storage(e.to_string()))?
    }

    async fn list_urls(&self, session_id: &str) -> Result<Vec<String>, CacheError> {
        let db_path = self.db_path.clone();
        let session_id = session_id.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT url FROM cached_sources WHERE session_id = ?1 ORDER BY timestamp ASC",
                )
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![session_id], |row| row.get::<_, String>(0))
                .map_err(|e| CacheError::Storage(e.to_string()))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|e| CacheError::Storage(e.to_string()))
        })
        .await
        .map_err(|e| CacheError::Storage(e.to_string()))?
    }

    // Default contains_quote (get + match in memory) is used; the quote match
    // must normalize whitespace, which SQL LIKE cannot express.
}
