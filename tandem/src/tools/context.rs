//! Context passed into tool calls for the current step.
//!
//! Agent nodes build this before executing tool invocations; it carries the
//! session id every session-scoped store is namespaced by, the invoking
//! agent's node id for event attribution, the stream writer, and the run's
//! auto-approve flag.

use crate::stream::StreamWriter;

/// Per-call context available to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolCallContext {
    /// Session id; namespaces the citation cache, plan store, and approvals.
    pub session_id: String,
    /// Node id of the invoking agent (e.g. "researcher"), for event payloads.
    pub agent: String,
    /// Writer for typed stream events (approval_request etc.).
    pub stream: StreamWriter,
    /// Whether this run opted into auto-approval of small writes.
    pub auto_approve: bool,
}

impl ToolCallContext {
    /// Context with a no-op stream, for tests and headless runs.
    pub fn new(session_id: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            agent: agent.into(),
            stream: StreamWriter::noop(),
            auto_approve: false,
        }
    }

    pub fn with_stream(mut self, stream: StreamWriter) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }
}
