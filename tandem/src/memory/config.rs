//! Per-run configuration passed to `CompiledStateGraph::invoke`.

/// Configuration for one graph run.
///
/// `session_id` selects the checkpoint namespace and the citation-cache
/// namespace; it is supplied by the caller and opaque to the system.
#[derive(Debug, Clone, Default)]
pub struct RunConfig {
    /// Session id. Required whenever a checkpointer is attached.
    pub session_id: Option<String>,
    /// Load a specific checkpoint instead of the latest (time travel).
    pub checkpoint_id: Option<String>,
    /// Approve write/edit operations below the size threshold without waiting.
    pub auto_approve: bool,
}

impl RunConfig {
    /// Config for a session, resuming from the latest checkpoint.
    pub fn for_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            checkpoint_id: None,
            auto_approve: false,
        }
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }
}
