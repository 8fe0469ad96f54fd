//! Supervisor tool node: executes the supervisor-local tool calls of the
//! latest assistant message (plan tools, file tools), then returns control to
//! the supervisor.

use std::sync::Arc;

use async_trait::async_trait;
use stream_event::ProtocolEvent;

use crate::approval::ApprovalHub;
use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::message::Message;
use crate::tools::{ToolCallContext, ToolRegistry};

use super::role::WorkerRole;
use super::state::OrchestratorState;
use super::supervisor::SUPERVISOR_NODE;

/// Node id of the supervisor tool executor.
pub const SUPERVISOR_TOOLS_NODE: &str = "supervisor_tools";

pub struct SupervisorToolsNode {
    registry: Arc<ToolRegistry>,
    approvals: Arc<ApprovalHub>,
}

impl SupervisorToolsNode {
    pub fn new(registry: Arc<ToolRegistry>, approvals: Arc<ApprovalHub>) -> Self {
        Self {
            registry,
            approvals,
        }
    }
}

#[async_trait]
impl Node<OrchestratorState> for SupervisorToolsNode {
    fn id(&self) -> &str {
        SUPERVISOR_TOOLS_NODE
    }

    async fn run(&self, state: OrchestratorState) -> Result<(OrchestratorState, Next), AgentError> {
        self.run_with_context(state, &RunContext::new(Default::default()))
            .await
    }

    async fn run_with_context(
        &self,
        mut state: OrchestratorState,
        ctx: &RunContext,
    ) -> Result<(OrchestratorState, Next), AgentError> {
        let calls: Vec<_> = state
            .messages
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Assistant { .. }))
            .map(|m| m.tool_calls().to_vec())
            .unwrap_or_default();

        let tool_ctx = ToolCallContext::new(ctx.session_id(), SUPERVISOR_NODE)
            .with_stream(ctx.stream.clone())
            .with_auto_approve(ctx.config.auto_approve);

        for call in calls {
            if WorkerRole::from_delegation_tool(&call.name).is_some() {
                continue; // delegations are routed, not executed
            }
            if ctx.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            ctx.stream
                .emit(ProtocolEvent::ToolCall {
                    agent: SUPERVISOR_NODE.to_string(),
                    invocation_id: call.id.clone(),
                    name: call.name.clone(),
                    arguments: call.arguments.clone(),
                })
                .await;
            let (content, is_error) = match self
                .registry
                .call(&call.name, call.arguments.clone(), &tool_ctx)
                .await
            {
                Ok(out) => (out.text, false),
                Err(e) => (e.to_string(), true),
            };
            ctx.stream
                .emit(ProtocolEvent::ToolResult {
                    invocation_id: call.id.clone(),
                    name: call.name.clone(),
                    content: content.clone(),
                    is_error,
                })
                .await;
            state.messages.push(Message::Tool {
                invocation_id: call.id.clone(),
                name: call.name.clone(),
                content,
                is_error,
            });
        }

        let queue = self.approvals.queue_for(ctx.session_id());
        state.pending_approvals = queue
            .snapshot()
            .await
            .into_iter()
            .filter(|r| r.status == crate::approval::ApprovalStatus::Pending)
            .map(|r| r.id)
            .collect();

        Ok((state, Next::Node(SUPERVISOR_NODE.to_string())))
    }
}
