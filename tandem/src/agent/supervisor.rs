//! Supervisor agent node: plan → delegate → coordinate → verify → synthesize.
//!
//! The supervisor owns the top-level message log. Its tool set is exactly
//! {delegation stubs, plan tools, file tools}; binding a research tool fails
//! at registry construction. One LLM turn per node visit: the router then
//! decides worker / supervisor tools / end from the produced message.

use std::sync::Arc;

use async_trait::async_trait;
use stream_event::ProtocolEvent;
use tracing::warn;

use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::ToolRegistry;

use super::delegate::parse_delegation;
use super::role::WorkerRole;
use super::state::OrchestratorState;

/// Node id of the supervisor.
pub const SUPERVISOR_NODE: &str = "supervisor";

pub struct SupervisorNode {
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    system_prompt: &'static str,
}

impl SupervisorNode {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        system_prompt: &'static str,
    ) -> Self {
        Self {
            llm,
            registry,
            system_prompt,
        }
    }

    fn conversation(&self, state: &OrchestratorState) -> Vec<Message> {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(self.system_prompt));
        messages.extend(state.messages.iter().cloned());
        messages
    }
}

#[async_trait]
impl Node<OrchestratorState> for SupervisorNode {
    fn id(&self) -> &str {
        SUPERVISOR_NODE
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
        let response = self.llm.invoke(&self.conversation(&state)).await?;

        if !response.content.is_empty() {
            ctx.stream
                .emit(ProtocolEvent::LlmThinking {
                    agent: SUPERVISOR_NODE.to_string(),
                    content: response.content.clone(),
                })
                .await;
        }

        state.tools_in_context = self.registry.names().to_vec();
        state.active_worker = None;
        state.pending_delegation = None;
        state.routing_reason = None;

        // Parse the first delegation; extra delegations in one step are
        // answered with a structured error so the invocation ids still
        // resolve, and a warning is logged.
        let mut extra_delegations: Vec<(String, String)> = Vec::new();
        for call in &response.tool_calls {
            if let Some(worker) = WorkerRole::from_delegation_tool(&call.name) {
                if state.pending_delegation.is_none() {
                    let delegation = parse_delegation(&call.id, worker, &call.arguments);
                    let mut reason = format!("delegating to {}", worker.node_id());
                    if !delegation.warnings.is_empty() {
                        reason.push_str(&format!(" (warnings: {})", delegation.warnings.join("; ")));
                        warn!(
                            worker = worker.node_id(),
                            warnings = ?delegation.warnings,
                            "delegation contract lint"
                        );
                    }
                    state.routing_reason = Some(reason);
                    state.active_worker = Some(worker);
                    state.pending_delegation = Some(delegation);
                } else {
                    extra_delegations.push((call.id.clone(), call.name.clone()));
                }
            }
        }

        state
            .messages
            .push(Message::assistant_with_calls(
                response.content,
                response.tool_calls,
            ));

        for (invocation_id, name) in extra_delegations {
            warn!(tool = %name, "second delegation in one supervisor step rejected");
            state.messages.push(Message::tool_error(
                invocation_id,
                name,
                "only one worker may be delegated per supervisor step; re-issue this \
                 delegation after the current worker returns",
            ));
        }

        if state.pending_delegation.is_none()
            && state
                .messages
                .last()
                .map(|m| m.tool_calls().is_empty())
                .unwrap_or(true)
        {
            // Terminal synthesis turn.
            if let Some(Message::Assistant { content, .. }) = state
                .messages
                .iter()
                .rev()
                .find(|m| matches!(m, Message::Assistant { .. }))
            {
                state.final_response = Some(content.clone());
            }
        }

        Ok((state, Next::Continue))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmResponse, MockLlm};
    use crate::memory::RunConfig;
    use crate::message::ToolInvocation;
    use crate::tools::ToolRegistry;

    fn registry() -> Arc<ToolRegistry> {
        Arc::new(ToolRegistry::new(vec![]).unwrap())
    }

    /// **Scenario**: a delegation turn records the contract and the worker.
    #[tokio::test]
    async fn delegation_turn() {
        let llm = Arc::new(MockLlm::scripted(vec![LlmResponse::with_calls(
            "sending the researcher",
            vec![ToolInvocation::new(
                "delegate_to_researcher",
                serde_json::json!({
                    "task": "find release dates",
                    "expected_outputs": "report",
                    "success_criteria": "verified citations"
                }),
            )],
        )]));
        let node = SupervisorNode::new(llm, registry(), "prompt");
        let ctx = RunContext::new(RunConfig::for_session("s1"));
        let (state, next) = node
            .run_with_context(OrchestratorState::for_query("when?"), &ctx)
            .await
            .unwrap();
        assert_eq!(next, Next::Continue);
        assert_eq!(state.active_worker, Some(WorkerRole::Researcher));
        let delegation = state.pending_delegation.unwrap();
        assert_eq!(delegation.task, "find release dates");
        assert!(delegation.warnings.is_empty());
        assert!(state.final_response.is_none());
    }

    /// **Scenario**: a second delegation in the same step gets a structured
    /// tool error answering its invocation id.
    #[tokio::test]
    async fn second_delegation_rejected() {
        let llm = Arc::new(MockLlm::scripted(vec![LlmResponse::with_calls(
            "",
            vec![
                ToolInvocation::new(
                    "delegate_to_researcher",
                    serde_json::json!({"task": "a", "expected_outputs": "o", "success_criteria": "c"}),
                ),
                ToolInvocation::new(
                    "delegate_to_writer",
                    serde_json::json!({"task": "b", "expected_outputs": "o", "success_criteria": "c"}),
                ),
            ],
        )]));
        let node = SupervisorNode::new(llm, registry(), "prompt");
        let ctx = RunContext::new(RunConfig::for_session("s1"));
        let (state, _) = node
            .run_with_context(OrchestratorState::for_query("q"), &ctx)
            .await
            .unwrap();
        assert_eq!(state.active_worker, Some(WorkerRole::Researcher));
        let last = state.messages.last().unwrap();
        assert!(
            matches!(last, Message::Tool { is_error, name, .. } if *is_error && name == "delegate_to_writer")
        );
    }

    /// **Scenario**: a turn without tool calls is terminal synthesis.
    #[tokio::test]
    async fn synthesis_turn_sets_final_response() {
        let llm = Arc::new(MockLlm::fixed("the answer"));
        let node = SupervisorNode::new(llm, registry(), "prompt");
        let ctx = RunContext::new(RunConfig::for_session("s1"));
        let (state, _) = node
            .run_with_context(OrchestratorState::for_query("q"), &ctx)
            .await
            .unwrap();
        assert_eq!(state.final_response.as_deref(), Some("the answer"));
    }
}
