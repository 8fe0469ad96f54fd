//! Orchestrator graph state.
//!
//! One state struct flows through supervisor, router, and worker nodes and is
//! checkpointed whole at every node boundary, so a session resumes exactly
//! where it left off.

use serde::{Deserialize, Serialize};

use crate::message::Message;

use super::role::WorkerRole;

/// A parsed delegation contract from a supervisor `delegate_to_*` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
    /// Invocation id of the delegation tool call; the worker's reply answers it.
    pub invocation_id: String,
    pub worker: WorkerRole,
    pub task: String,
    /// Absolute paths of input artifacts the worker should read.
    #[serde(default)]
    pub input_paths: Vec<String>,
    #[serde(default)]
    pub expected_outputs: String,
    #[serde(default)]
    pub success_criteria: String,
    /// Contract lint findings surfaced to the stream as the transition reason.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// State carried across orchestrator steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorState {
    /// Top-level message log owned by the supervisor.
    pub messages: Vec<Message>,
    /// Latest plan snapshot, mirrored into the checkpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<serde_json::Value>,
    /// Worker the router selected for the current step, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_worker: Option<WorkerRole>,
    /// Why the router chose the current route (streamed on transition).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_reason: Option<String>,
    /// The delegation contract awaiting the active worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_delegation: Option<Delegation>,
    /// Tool names bound to the agent that ran last, for observability.
    #[serde(default)]
    pub tools_in_context: Vec<String>,
    /// Ids of approval requests still pending at the last boundary.
    #[serde(default)]
    pub pending_approvals: Vec<String>,
    /// The supervisor's user-facing reply, once synthesized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}

impl OrchestratorState {
    /// Fresh state holding one user message.
    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::user(query)],
            ..Self::default()
        }
    }

    /// Appends a follow-up user message and clears per-run routing fields so
    /// a resumed session starts a clean supervisor step.
    pub fn push_user_query(&mut self, query: impl Into<String>) {
        self.messages.push(Message::user(query));
        self.active_worker = None;
        self.routing_reason = None;
        self.pending_delegation = None;
        self.final_response = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: state round-trips through serde (checkpoint payload).
    #[test]
    fn state_serde_roundtrip() {
        let mut state = OrchestratorState::for_query("what changed?");
        state.active_worker = Some(WorkerRole::Researcher);
        state.pending_delegation = Some(Delegation {
            invocation_id: "inv-1".into(),
            worker: WorkerRole::Researcher,
            task: "find the change".into(),
            input_paths: vec!["/workspace/notes.md".into()],
            expected_outputs: "a cited report".into(),
            success_criteria: "all citations verify".into(),
            warnings: vec![],
        });
        let json = serde_json::to_string(&state).unwrap();
        let back: OrchestratorState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.messages.len(), 1);
        assert_eq!(back.active_worker, Some(WorkerRole::Researcher));
        assert_eq!(back.pending_delegation.unwrap().task, "find the change");
    }

    /// **Scenario**: a follow-up query clears routing state but keeps the log.
    #[test]
    fn follow_up_clears_routing() {
        let mut state = OrchestratorState::for_query("first");
        state.active_worker = Some(WorkerRole::Writer);
        state.final_response = Some("done".into());
        state.push_user_query("second");
        assert_eq!(state.messages.len(), 2);
        assert!(state.active_worker.is_none());
        assert!(state.final_response.is_none());
    }
}
