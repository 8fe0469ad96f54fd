//! Worker agent node: a bounded reasoning loop with a bound tool set.
//!
//! One node visit runs the whole delegated task: the worker loops
//! think → tool → observe until it produces a terminal reply that passes its
//! gates, then answers the supervisor's delegation invocation.
//!
//! Gates before any terminal reply:
//! - **Completion**: when the session has a plan, every step must be done and
//!   the worker must have read the plan back (`read_current_plan`). A reply
//!   attempted earlier loops the worker back into execution.
//! - **Verification** (researcher): every citation in the reply must verify
//!   against the session's citation cache. The worker is steered to
//!   `get_cached_source` and correction; the supervisor never sees an
//!   unverified report.
//!
//! Out-of-set tools return structured errors the worker can recover from;
//! the third identical call injects a loop warning and a fourth fails the
//! task.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use stream_event::ProtocolEvent;
use tracing::{debug, warn};

use crate::approval::ApprovalHub;
use crate::cache::CitationCache;
use crate::citation::parse_source_list;
use crate::error::AgentError;
use crate::graph::{Next, Node, RunContext};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::tools::{ToolCallContext, ToolRegistry, TOOL_READ_PLAN};

use super::loop_detect::{LoopDetector, LoopVerdict};
use super::role::WorkerRole;
use super::state::{Delegation, OrchestratorState};
use super::supervisor::SUPERVISOR_NODE;

/// How a worker run ended, answering the delegation invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Terminal reply that passed every gate.
    Reply(String),
    /// The worker could not finish (loop, turn budget).
    Failure(String),
}

pub struct WorkerNode {
    role: WorkerRole,
    llm: Arc<dyn LlmClient>,
    registry: Arc<ToolRegistry>,
    plans: Arc<crate::tools::PlanStore>,
    cache: Arc<dyn CitationCache>,
    approvals: Arc<ApprovalHub>,
    system_prompt: &'static str,
    max_turns: u32,
}

impl WorkerNode {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        role: WorkerRole,
        llm: Arc<dyn LlmClient>,
        registry: Arc<ToolRegistry>,
        plans: Arc<crate::tools::PlanStore>,
        cache: Arc<dyn CitationCache>,
        approvals: Arc<ApprovalHub>,
        system_prompt: &'static str,
        max_turns: u32,
    ) -> Self {
        Self {
            role,
            llm,
            registry,
            plans,
            cache,
            approvals,
            system_prompt,
            max_turns,
        }
    }

    fn task_briefing(delegation: &Delegation) -> String {
        let mut briefing = format!("Task: {}\n", delegation.task);
        if !delegation.input_paths.is_empty() {
            briefing.push_str(&format!("Inputs: {}\n", delegation.input_paths.join(", ")));
        }
        if !delegation.expected_outputs.is_empty() {
            briefing.push_str(&format!("Expected outputs: {}\n", delegation.expected_outputs));
        }
        if !delegation.success_criteria.is_empty() {
            briefing.push_str(&format!("Success criteria: {}\n", delegation.success_criteria));
        }
        briefing
    }

    /// Completion gate: with a session plan present, a terminal reply needs
    /// every step done and a plan read-back in this run.
    fn completion_gate(
        &self,
        session_id: &str,
        called_tools: &HashSet<String>,
    ) -> Result<(), String> {
        let Some(plan) = self.plans.get(session_id) else {
            return Ok(());
        };
        if !plan.all_steps_done() {
            let open: Vec<String> = plan
                .steps()
                .iter()
                .filter(|s| !s.status.is_terminal())
                .map(|s| format!("step {} ({})", s.index, s.description))
                .collect();
            return Err(format!(
                "the plan is not finished: {} still open. Continue executing and call \
                 update_plan_progress after each step.",
                open.join(", ")
            ));
        }
        if !called_tools.contains(TOOL_READ_PLAN) {
            return Err(format!(
                "confirm completion first: call {TOOL_READ_PLAN} and check \
                 all_steps_completed before your final reply."
            ));
        }
        Ok(())
    }

    /// Verification gate (researcher): every tail citation must verify.
    async fn verification_gate(&self, session_id: &str, reply: &str) -> Result<(), String> {
        if self.role != WorkerRole::Researcher {
            return Ok(());
        }
        let citations = match parse_source_list(reply) {
            Ok(c) => c,
            Err(e) => {
                return Err(format!(
                    "your reply has no valid source list ({e}). Add inline citations and a \
                     ## Sources section, then verify with verify_citations."
                ))
            }
        };
        let mut failures = Vec::new();
        for c in &citations {
            let ok = self
                .cache
                .contains_quote(session_id, &c.url, &c.quote)
                .await
                .unwrap_or(false);
            if !ok {
                failures.push(format!("[{}] {}", c.ref_num, c.url));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "citations failed verification: {}. Re-open the sources with \
                 get_cached_source, correct the quotes, and re-verify before replying.",
                failures.join(", ")
            ))
        }
    }

    async fn run_loop(
        &self,
        delegation: &Delegation,
        ctx: &RunContext,
    ) -> Result<WorkerOutcome, AgentError> {
        let mut conv = vec![
            Message::system(self.system_prompt),
            Message::user(Self::task_briefing(delegation)),
        ];
        let tool_ctx = ToolCallContext::new(ctx.session_id(), self.role.node_id())
            .with_stream(ctx.stream.clone())
            .with_auto_approve(ctx.config.auto_approve);
        let mut detector = LoopDetector::new();
        let mut called_tools: HashSet<String> = HashSet::new();

        for turn in 0..self.max_turns {
            if ctx.cancel.is_cancelled() {
                return Err(AgentError::Cancelled);
            }
            let response = self.llm.invoke(&conv).await?;
            if !response.content.is_empty() {
                ctx.stream
                    .emit(ProtocolEvent::LlmThinking {
                        agent: self.role.node_id().to_string(),
                        content: response.content.clone(),
                    })
                    .await;
            }

            if response.tool_calls.is_empty() {
                // Terminal candidate: run the gates.
                if let Err(correction) = self.completion_gate(ctx.session_id(), &called_tools) {
                    debug!(role = self.role.node_id(), turn, "completion gate held reply");
                    conv.push(Message::assistant(response.content));
                    conv.push(Message::user(correction));
                    continue;
                }
                if let Err(correction) = self
                    .verification_gate(ctx.session_id(), &response.content)
                    .await
                {
                    debug!(role = self.role.node_id(), turn, "verification gate held reply");
                    conv.push(Message::assistant(response.content));
                    conv.push(Message::user(correction));
                    continue;
                }
                return Ok(WorkerOutcome::Reply(response.content));
            }

            conv.push(Message::assistant_with_calls(
                response.content,
                response.tool_calls.clone(),
            ));
            for call in &response.tool_calls {
                if ctx.cancel.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
                match detector.observe(&call.name, &call.arguments) {
                    LoopVerdict::Forbidden => {
                        warn!(role = self.role.node_id(), tool = %call.name, "loop detector failed the task");
                        return Ok(WorkerOutcome::Failure(format!(
                            "worker {} aborted: four identical calls to {}",
                            self.role.node_id(),
                            call.name
                        )));
                    }
                    LoopVerdict::InjectWarning => {
                        let text = LoopDetector::warning_text(&call.name);
                        ctx.stream
                            .emit(ProtocolEvent::ToolResult {
                                invocation_id: call.id.clone(),
                                name: call.name.clone(),
                                content: text.clone(),
                                is_error: true,
                            })
                            .await;
                        conv.push(Message::tool_error(&call.id, &call.name, text));
                        continue;
                    }
                    LoopVerdict::Proceed => {}
                }

                ctx.stream
                    .emit(ProtocolEvent::ToolCall {
                        agent: self.role.node_id().to_string(),
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
                    Ok(out) => {
                        called_tools.insert(call.name.clone());
                        (out.text, false)
                    }
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
                conv.push(Message::Tool {
                    invocation_id: call.id.clone(),
                    name: call.name.clone(),
                    content,
                    is_error,
                });
            }
        }

        Ok(WorkerOutcome::Failure(format!(
            "worker {} exceeded its turn budget of {}",
            self.role.node_id(),
            self.max_turns
        )))
    }
}

#[async_trait]
impl Node<OrchestratorState> for WorkerNode {
    fn id(&self) -> &str {
        self.role.node_id()
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
        let Some(delegation) = state.pending_delegation.take() else {
            // Defensive: routed here without a contract.
            state.messages.push(Message::tool_error(
                uuid::Uuid::new_v4().to_string(),
                self.role.delegation_tool(),
                "no pending delegation for this worker",
            ));
            return Ok((state, Next::Node(SUPERVISOR_NODE.to_string())));
        };

        ctx.stream
            .emit(ProtocolEvent::WorkerTransition {
                from: SUPERVISOR_NODE.to_string(),
                to: self.role.node_id().to_string(),
                reason: state.routing_reason.clone(),
            })
            .await;

        state.tools_in_context = self.registry.names().to_vec();
        let outcome = self.run_loop(&delegation, ctx).await?;

        let (content, is_error, reason) = match outcome {
            WorkerOutcome::Reply(reply) => (reply, false, "worker reply".to_string()),
            WorkerOutcome::Failure(message) => (message, true, "worker failure".to_string()),
        };
        state.messages.push(Message::Tool {
            invocation_id: delegation.invocation_id.clone(),
            name: self.role.delegation_tool().to_string(),
            content,
            is_error,
        });

        state.active_worker = None;
        state.routing_reason = None;
        state.plan = self.plans.get(ctx.session_id()).map(|p| p.snapshot());
        let queue = self.approvals.queue_for(ctx.session_id());
        state.pending_approvals = queue
            .snapshot()
            .await
            .into_iter()
            .filter(|r| r.status == crate::approval::ApprovalStatus::Pending)
            .map(|r| r.id)
            .collect();

        ctx.stream
            .emit(ProtocolEvent::WorkerTransition {
                from: self.role.node_id().to_string(),
                to: SUPERVISOR_NODE.to_string(),
                reason: Some(reason),
            })
            .await;

        Ok((state, Next::Node(SUPERVISOR_NODE.to_string())))
    }
}
