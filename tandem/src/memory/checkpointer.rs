//! Checkpointer trait and CheckpointError.
//!
//! Saves and loads checkpoints by `(session_id, checkpoint_id)`.

use async_trait::async_trait;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem};
use crate::memory::config::RunConfig;

/// Error type for checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("session_id required")]
    SessionIdRequired,
    #[error("serialization: {0}")]
    Serialization(String),
    #[error("storage: {0}")]
    Storage(String),
}

/// Saves and loads checkpoints by `(session_id, checkpoint_id)`.
///
/// **Interaction**: injected at compile via
/// `StateGraph::compile_with_checkpointer`; the interpreter calls `put` at
/// every node boundary and `latest` when resuming a session.
#[async_trait]
pub trait Checkpointer<S>: Send + Sync
where
    S: Clone + Send + Sync + 'static,
{
    /// Persist a checkpoint for the session. Returns the checkpoint id used.
    async fn put(
        &self,
        config: &RunConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError>;

    /// Load the latest checkpoint for the session (or the one selected by
    /// `config.checkpoint_id`).
    async fn latest(&self, config: &RunConfig) -> Result<Option<Checkpoint<S>>, CheckpointError>;

    /// List checkpoint metadata for the session, oldest first.
    async fn list(
        &self,
        config: &RunConfig,
        limit: Option<usize>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError>;
}

pub(crate) fn session_id_required(config: &RunConfig) -> Result<String, CheckpointError> {
    config
        .session_id
        .as_deref()
        .ok_or(CheckpointError::SessionIdRequired)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: Display of each CheckpointError variant contains expected keywords.
    #[test]
    fn checkpoint_error_display_all_variants() {
        assert!(CheckpointError::SessionIdRequired
            .to_string()
            .contains("session"));
        assert!(CheckpointError::Serialization("err".into())
            .to_string()
            .contains("serialization"));
        assert!(CheckpointError::Storage("io".into())
            .to_string()
            .contains("storage"));
    }

    /// **Scenario**: session_id_required errors on a config without an id.
    #[test]
    fn session_id_required_check() {
        let cfg = RunConfig::default();
        assert!(matches!(
            session_id_required(&cfg),
            Err(CheckpointError::SessionIdRequired)
        ));
        let cfg = RunConfig::for_session("s");
        assert_eq!(session_id_required(&cfg).unwrap(), "s");
    }
}
