//! Delegation router: a pure function of the latest supervisor message.
//!
//! If the supervisor's last assistant message contains a `delegate_to_*`
//! call, route to that worker's node; if it contains supervisor-local tool
//! calls (plan, file), route to the supervisor tool node; otherwise the
//! supervisor has synthesized and the run ends. Exactly one worker is
//! selected per supervisor step.

use crate::message::Message;

use super::role::WorkerRole;
use super::state::OrchestratorState;

/// Where a supervisor step routes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorRoute {
    Worker(WorkerRole),
    SupervisorTools,
    End,
}

impl SupervisorRoute {
    /// Routing key used by the graph's conditional edges.
    pub fn key(&self) -> String {
        match self {
            SupervisorRoute::Worker(w) => w.node_id().to_string(),
            SupervisorRoute::SupervisorTools => "supervisor_tools".to_string(),
            SupervisorRoute::End => crate::graph::END.to_string(),
        }
    }
}

/// Routes from the latest supervisor assistant message. Pure.
pub fn route_supervisor(state: &OrchestratorState) -> SupervisorRoute {
    let Some(Message::Assistant { tool_calls, .. }) = state
        .messages
        .iter()
        .rev()
        .find(|m| matches!(m, Message::Assistant { .. }))
    else {
        return SupervisorRoute::End;
    };
    if tool_calls.is_empty() {
        return SupervisorRoute::End;
    }
    // First delegation call wins; the supervisor node already warned about
    // extra delegations in the same step.
    for call in tool_calls {
        if let Some(worker) = WorkerRole::from_delegation_tool(&call.name) {
            return SupervisorRoute::Worker(worker);
        }
    }
    SupervisorRoute::SupervisorTools
}
