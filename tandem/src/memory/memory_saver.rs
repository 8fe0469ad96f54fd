//! In-memory checkpointer for dev and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::checkpoint::{Checkpoint, CheckpointListItem};
use super::checkpointer::{session_id_required, CheckpointError, Checkpointer};
use super::config::RunConfig;

/// In-memory checkpointer keyed by session id. Not persistent.
#[derive(Default)]
pub struct MemorySaver<S> {
    by_session: RwLock<HashMap<String, Vec<Checkpoint<S>>>>,
}

impl<S> MemorySaver<S> {
    pub fn new() -> Self {
        Self {
            by_session: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let session_id = session_id_required(config)?;
        let mut map = self.by_session.write().await;
        map.entry(session_id).or_default().push(checkpoint.clone());
        Ok(checkpoint.id.clone())
    }

    async fn latest(&self, config: &RunConfig) -> Result<Option<Checkpoint<S>>, CheckpointError> {
        let session_id = session_id_required(config)?;
        let map = self.by_session.read().await;
        let Some(list) = map.get(&session_id) else {
            return Ok(None);
        };
        match &config.checkpoint_id {
            Some(id) => Ok(list.iter().find(|c| &c.id == id).cloned()),
            None => Ok(list.last().cloned()),
        }
    }

    async fn list(
        &self,
        config: &RunConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let session_id = session_id_required(config)?;
        let map = self.by_session.read().await;
        let mut items: Vec<CheckpointListItem> = map
            .get(&session_id)
            .map(|list| {
                list.iter()
                    .map(|c| CheckpointListItem {
                        checkpoint_id: c.id.clone(),
                        metadata: c.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(n) = limit {
            let len = items.len();
            if len > n {
                items = items.split_off(len - n);
            }
        }
        Ok(items)
    }
}
