//! Checkpoint and metadata types.

use std::time::SystemTime;

/// Where in the run lifecycle a checkpoint was taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckpointSource {
    /// Snapshot of the input state before the first node ran.
    #[default]
    Input,
    /// Snapshot taken at a node boundary inside the run loop.
    Boundary,
    /// Snapshot taken when the run paused on an interrupt (approval wait).
    Interrupt,
}

/// Metadata for a single checkpoint.
#[derive(Debug, Clone, Default)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Step number: -1 for input, 0.. for node boundaries.
    pub step: i64,
    pub created_at: Option<SystemTime>,
}

/// One checkpoint: full state snapshot plus id/ts/metadata.
///
/// Stored by a [`Checkpointer`](super::Checkpointer) keyed by
/// `(session_id, checkpoint_id)`.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    /// Unique checkpoint id.
    pub id: String,
    /// Milliseconds since epoch as a string, for stable ordering in storage.
    pub ts: String,
    /// The full graph state at the boundary.
    pub state: S,
    pub metadata: CheckpointMetadata,
}

/// Item returned by `Checkpointer::list` for history inspection.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// Creates a checkpoint from current state.
    pub fn from_state(state: S, source: CheckpointSource, step: i64) -> Self {
        let now = SystemTime::now();
        let ts = now
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis().to_string())
            .unwrap_or_else(|_| "0".to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts,
            state,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(now),
            },
        }
    }
}
