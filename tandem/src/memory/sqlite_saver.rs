//! SQLite-backed checkpointer. Persistent across process restarts.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
use super::checkpointer::{session_id_required, CheckpointError, Checkpointer};
use super::config::RunConfig;

fn source_to_str(s: &CheckpointSource) -> &'static str {
    match s {
        CheckpointSource::Input => "Input",
        CheckpointSource::Boundary => "Boundary",
        CheckpointSource::Interrupt => "Interrupt",
    }
}

fn str_to_source(s: &str) -> CheckpointSource {
    match s {
        "Input" => CheckpointSource::Input,
        "Interrupt" => CheckpointSource::Interrupt,
        _ => CheckpointSource::Boundary,
    }
}

fn created_at_to_i64(t: &Option<std::time::SystemTime>) -> Option<i64> {
    t.as_ref().and_then(|t| {
        t.duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_millis() as i64)
    })
}

fn i64_to_created_at(v: Option<i64>) -> Option<std::time::SystemTime> {
    v.and_then(|ms| std::time::UNIX_EPOCH.checked_add(std::time::Duration::from_millis(ms as u64)))
}

/// SQLite-backed checkpointer. Key: `(session_id, checkpoint_id)`.
///
/// State is stored as JSON; `S` must be serde-serializable. Uses
/// spawn_blocking for async.
///
/// **Interaction**: used as `Arc<dyn Checkpointer<S>>` in
/// `StateGraph::compile_with_checkpointer`.
pub struct SqliteSaver<S> {
    db_path: std::path::PathBuf,
    _state: std::marker::PhantomData<fn() -> S>,
}

impl<S> SqliteSaver<S>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Creates a new SQLite checkpointer and ensures the table exists.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            }
        }
        let conn = rusqlite::Connection::open(&db_path)
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                session_id TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL,
                ts TEXT NOT NULL,
                payload TEXT NOT NULL,
                metadata_source TEXT NOT NULL,
                metadata_step INTEGER NOT NULL,
                metadata_created_at INTEGER,
                PRIMARY KEY (session_id, checkpoint_id)
            )
            "#,
            [],
        )
        .map_err(|e| CheckpointError::Storage(e.to_string()))?;
        Ok(Self {
            db_path,
            _state: std::marker::PhantomData,
        })
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let session_id = session_id_required(config)?;
        let payload = serde_json::to_string(&checkpoint.state)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let metadata_source = source_to_str(&checkpoint.metadata.source).to_string();
        let metadata_step = checkpoint.metadata.step;
        let metadata_created_at = created_at_to_i64(&checkpoint.metadata.created_at);
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            conn.execute(
                r#"
                INSERT OR REPLACE INTO checkpoints
                (session_id, checkpoint_id, ts, payload, metadata_source, metadata_step, metadata_created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    session_id,
                    id.clone(),
                    ts,
                    payload,
                    metadata_source,
                    metadata_step,
                    metadata_created_at,
                ],
            )
            .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            Ok::<String, CheckpointError>(id)
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))?
    }

    async fn latest(&self, config: &RunConfig) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let session_id = session_id_required(config)?;
        let want_id = config.checkpoint_id.clone();
        let db_path = self.db_path.clone();

        type RowData = (String, String, String, String, i64, Option<i64>);
        let row: Option<RowData> =
            tokio::task::spawn_blocking(move || -> Result<Option<RowData>, CheckpointError> {
                let conn = rusqlite::Connection::open(&db_path)
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?;
                let sql = if want_id.is_some() {
                    "SELECT checkpoint_id, ts, payload, metadata_source, metadata_step, metadata_created_at
                     FROM checkpoints WHERE session_id = ?1 AND checkpoint_id = ?2"
                } else {
                    "SELECT checkpoint_id, ts, payload, metadata_source, metadata_step, metadata_created_at
                     FROM checkpoints WHERE session_id = ?1
                     ORDER BY metadata_step DESC, metadata_created_at DESC LIMIT 1"
                };
                let mut stmt = conn
                    .prepare(sql)
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?;
                let mut rows = if let Some(ref cid) = want_id {
                    stmt.query(params![session_id, cid])
                } else {
                    stmt.query(params![session_id])
                }
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
                let row = match rows
                    .next()
                    .map_err(|e| CheckpointError::Storage(e.to_string()))?
                {
                    Some(r) => r,
                    None => return Ok(None),
                };
                let storage = |e: rusqlite::Error| CheckpointError::Storage(e.to_string());
                Ok(Some((
                    row.get::<_, String>(0).map_err(storage)?,
                    row.get::<_, String>(1).map_err(storage)?,
                    row.get::<_, String>(2).map_err(storage)?,
                    row.get::<_, String>(3).map_err(storage)?,
                    row.get::<_, i64>(4).map_err(storage)?,
                    row.get::<_, Option<i64>>(5).map_err(storage)?,
                )))
            })
            .await
            .map_err(|e| CheckpointError::Storage(e.to_string()))??;

        let Some((checkpoint_id, ts, payload, metadata_source, metadata_step, metadata_created_at)) =
            row
        else {
            return Ok(None);
        };

        let state: S = serde_json::from_str(&payload)
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        Ok(Some(Checkpoint {
            id: checkpoint_id,
            ts,
            state,
            metadata: CheckpointMetadata {
                source: str_to_source(&metadata_source),
                step: metadata_step,
                created_at: i64_to_created_at(metadata_created_at),
            },
        }))
    }

    async fn list(
        &self,
        config: &RunConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let session_id = session_id_required(config)?;
        let db_path = self.db_path.clone();

        let items = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path)
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, metadata_source, metadata_step, metadata_created_at
                     FROM checkpoints WHERE session_id = ?1
                     ORDER BY metadata_step ASC, metadata_created_at ASC",
                )
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let rows = stmt
                .query_map(params![session_id], |row| {
                    Ok(CheckpointListItem {
                        checkpoint_id: row.get(0)?,
                        metadata: CheckpointMetadata {
                            source: str_to_source(&row.get::<_, String>(1)?),
                            step: row.get::<_, i64>(2)?,
                            created_at: i64_to_created_at(row.get(3)?),
                        },
                    })
                })
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            let mut list: Vec<CheckpointListItem> = rows
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| CheckpointError::Storage(e.to_string()))?;
            if let Some(n) = limit {
                let len = list.len();
                if len > n {
                    list = list[len - n..].to_vec();
                }
            }
            Ok::<Vec<CheckpointListItem>, CheckpointError>(list)
        })
        .await
        .map_err(|e| CheckpointError::Storage(e.to_string()))??;

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FakeState {
        messages: Vec<String>,
        step: u32,
    }

    fn state(step: u32) -> FakeState {
        FakeState {
            messages: vec![format!("msg-{step}")],
            step,
        }
    }

    /// **Scenario**: put then latest round-trips the state through JSON.
    #[tokio::test]
    async fn put_latest_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let saver: SqliteSaver<FakeState> = SqliteSaver::new(dir.path().join("cp.db")).unwrap();
        let cfg = RunConfig::for_session("s1");
        saver
            .put(
                &cfg,
                &Checkpoint::from_state(state(0), CheckpointSource::Input, -1),
            )
            .await
            .unwrap();
        saver
            .put(
                &cfg,
                &Checkpoint::from_state(state(1), CheckpointSource::Boundary, 0),
            )
            .await
            .unwrap();

        let latest = saver.latest(&cfg).await.unwrap().unwrap();
        assert_eq!(latest.state, state(1));
        assert_eq!(latest.metadata.step, 0);
    }

    /// **Scenario**: restarting the process (new saver over the same file)
    /// resumes from the persisted checkpoint.
    #[tokio::test]
    async fn resume_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.db");
        let cfg = RunConfig::for_session("s1");
        {
            let saver: SqliteSaver<FakeState> = SqliteSaver::new(&path).unwrap();
            saver
                .put(
                    &cfg,
                    &Checkpoint::from_state(state(7), CheckpointSource::Boundary, 7),
                )
                .await
                .unwrap();
        }
        let saver: SqliteSaver<FakeState> = SqliteSaver::new(&path).unwrap();
        let latest = saver.latest(&cfg).await.unwrap().unwrap();
        assert_eq!(latest.state.step, 7);
    }

    /// **Scenario**: list is ordered oldest first and respects the limit.
    #[tokio::test]
    async fn list_ordered_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        let saver: SqliteSaver<FakeState> = SqliteSaver::new(dir.path().join("cp.db")).unwrap();
        let cfg = RunConfig::for_session("s1");
        for step in 0..4 {
            saver
                .put(
                    &cfg,
                    &Checkpoint::from_state(state(step as u32), CheckpointSource::Boundary, step),
                )
                .await
                .unwrap();
        }
        let all = saver.list(&cfg, None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].metadata.step, 0);
        let last_two = saver.list(&cfg, Some(2)).await.unwrap();
        assert_eq!(last_two[0].metadata.step, 2);
        assert_eq!(last_two[1].metadata.step, 3);
    }

    /// **Scenario**: sessions do not see each other's checkpoints.
    #[tokio::test]
    async fn sessions_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let saver: SqliteSaver<FakeState> = SqliteSaver::new(dir.path().join("cp.db")).unwrap();
        saver
            .put(
                &RunConfig::for_session("s1"),
                &Checkpoint::from_state(state(1), CheckpointSource::Boundary, 0),
            )
            .await
            .unwrap();
        assert!(saver
            .latest(&RunConfig::for_session("s2"))
            .await
            .unwrap()
            .is_none());
    }
}
