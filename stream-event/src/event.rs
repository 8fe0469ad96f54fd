//! Protocol-level event types (type + payload).
//!
//! Free-form payloads (plan snapshots, tool arguments) use `serde_json::Value`;
//! the core serializes its own types into that before emitting.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What changed about the session plan in a `plan_update` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanUpdateAction {
    Created,
    StepStarted,
    StepCompleted,
    StepSkipped,
    Replaced,
    Edited,
}

/// Classification of an `error` event. Streams stay alive through `Chunk`,
/// `Step`, and `ApprovalFlush` errors; `Cancelled` and `Fatal` are followed
/// by the terminal `stream_complete`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Chunk,
    Step,
    ApprovalFlush,
    Cancelled,
    Fatal,
}

/// Protocol event: wire shape for one stream event (type + payload).
/// Envelope fields (session_id, event_id) are applied separately.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProtocolEvent {
    /// Assistant reasoning text from an agent turn (supervisor or worker).
    LlmThinking { agent: String, content: String },
    /// An agent requested a tool invocation.
    ToolCall {
        agent: String,
        invocation_id: String,
        name: String,
        arguments: Value,
    },
    /// Result of one tool invocation, answering `invocation_id`.
    ToolResult {
        invocation_id: String,
        name: String,
        content: String,
        is_error: bool,
    },
    /// The session plan changed; `plan` carries the full snapshot.
    PlanUpdate {
        action: PlanUpdateAction,
        plan: Value,
    },
    /// Control moved between supervisor and a worker node.
    WorkerTransition {
        from: String,
        to: String,
        reason: Option<String>,
    },
    /// A write/edit operation is paused pending human approval.
    ApprovalRequest {
        approval_id: String,
        kind: String,
        target_path: String,
        proposed_content: Option<String>,
        diff: Option<String>,
        ttl_seconds: u64,
    },
    /// Terminal outcome of a previously emitted `approval_request`.
    ApprovalResolved {
        approval_id: String,
        decision: String,
    },
    /// A recoverable or fatal error surfaced to the client.
    Error { kind: ErrorKind, message: String },
    /// Terminal event; exactly one per stream, always last.
    StreamComplete { session_id: String, success: bool },
}

impl ProtocolEvent {
    /// Serializes this event to a JSON object (type + payload only; no envelope).
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// True for the terminal `stream_complete` variant.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProtocolEvent::StreamComplete { .. })
    }
}
