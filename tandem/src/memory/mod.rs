//! Checkpointing: per-session state snapshots for resumable orchestration.
//!
//! The graph interpreter checkpoints the entire orchestrator state at every
//! node boundary, keyed by `session_id`. Restarting the process and replaying
//! the graph with the same id resumes from the latest checkpoint.
//!
//! | Type | Persistence | Use case |
//! |---|---|---|
//! | [`MemorySaver`] | In-memory | Dev, tests |
//! | [`SqliteSaver`] | SQLite file | Single-node, production |

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunConfig;
pub use memory_saver::MemorySaver;
pub use sqlite_saver::SqliteSaver;
