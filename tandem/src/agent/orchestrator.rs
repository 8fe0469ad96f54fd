//! Orchestrator assembly: role tool sets, startup validation, graph wiring.
//!
//! `build_orchestrator` is the single place agents get their tools. The
//! supervisor registry is constructed through the forbidden-tool check and
//! every delegation spec passes the contract lint, so a mis-binding is a
//! startup failure instead of a runtime surprise.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::approval::ApprovalHub;
use crate::cache::CitationCache;
use crate::error::AgentError;
use crate::graph::{CompilationError, CompiledStateGraph, RunContext, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::memory::Checkpointer;
use crate::prompts::{get_prompt, PromptError, PromptVersion};
use crate::tools::{
    CreatePlanTool, EditFileTool, EditPlanTool, FileToolDeps, GetCachedSourceTool, PlanStore,
    ReadFileTool, ReadPlanTool, RegistryError, SearchCachedTool, SearchProvider, Tool,
    ToolRegistry, UpdatePlanProgressTool, VerifyCitationsTool, WriteFileTool,
};

use super::delegate::{lint_delegation_spec, DelegateTool};
use super::role::{AgentRole, WorkerRole};
use super::router::route_supervisor;
use super::state::OrchestratorState;
use super::supervisor::{SupervisorNode, SUPERVISOR_NODE};
use super::supervisor_tools::{SupervisorToolsNode, SUPERVISOR_TOOLS_NODE};
use super::worker::WorkerNode;

/// Startup errors from orchestrator assembly.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Compilation(#[from] CompilationError),
    #[error(transparent)]
    Prompt(#[from] PromptError),
    #[error("delegation contract lint: {0}")]
    DelegationLint(String),
}

/// Everything the orchestrator needs, supplied by the caller.
pub struct OrchestratorDeps {
    pub llm_supervisor: Arc<dyn LlmClient>,
    pub llm_worker: Arc<dyn LlmClient>,
    pub search: Arc<dyn SearchProvider>,
    pub cache: Arc<dyn CitationCache>,
    pub plans: Arc<PlanStore>,
    pub approvals: Arc<ApprovalHub>,
    pub checkpointer: Option<Arc<dyn Checkpointer<OrchestratorState>>>,
    pub workspace_root: PathBuf,
    pub prompt_version: PromptVersion,
    pub auto_approve_max_bytes: usize,
    pub max_worker_turns: u32,
    /// Additional tools for the supervisor; still subject to the
    /// forbidden-tool startup check.
    pub extra_supervisor_tools: Vec<Arc<dyn Tool>>,
}

/// The compiled orchestrator for one prompt version.
pub struct Orchestrator {
    graph: CompiledStateGraph<OrchestratorState>,
}

impl Orchestrator {
    /// Runs one user message in the session described by `ctx.config`,
    /// resuming from the latest checkpoint when one exists.
    pub async fn run(
        &self,
        message: &str,
        ctx: &RunContext,
    ) -> Result<OrchestratorState, AgentError> {
        let resumed = self
            .graph
            .latest_state(&ctx.config)
            .await
            .map_err(|e| AgentError::ExecutionFailed(e.to_string()))?;
        let state = match resumed {
            Some(mut s) => {
                s.push_user_query(message);
                s
            }
            None => OrchestratorState::for_query(message),
        };
        self.graph.invoke(state, ctx).await
    }
}

fn plan_tools(plans: &Arc<PlanStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(CreatePlanTool::new(plans.clone())),
        Arc::new(UpdatePlanProgressTool::new(plans.clone())),
        Arc::new(ReadPlanTool::new(plans.clone())),
        Arc::new(EditPlanTool::new(plans.clone())),
    ]
}

fn worker_tools(role: WorkerRole, deps: &OrchestratorDeps, file_deps: &FileToolDeps) -> Vec<Arc<dyn Tool>> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::new();
    match role {
        WorkerRole::Researcher => {
            tools.push(Arc::new(SearchCachedTool::new(
                deps.search.clone(),
                deps.cache.clone(),
            )));
            tools.push(Arc::new(GetCachedSourceTool::new(deps.cache.clone())));
            tools.push(Arc::new(VerifyCitationsTool::new(deps.cache.clone())));
            tools.extend(plan_tools(&deps.plans));
            tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
        }
        WorkerRole::DataScientist => {
            tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
            tools.push(Arc::new(WriteFileTool::new(file_deps.clone())));
            tools.extend(plan_tools(&deps.plans));
        }
        WorkerRole::ExpertAnalyst => {
            tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
            tools.extend(plan_tools(&deps.plans));
        }
        WorkerRole::Writer => {
            tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
            tools.push(Arc::new(WriteFileTool::new(file_deps.clone())));
            tools.push(Arc::new(EditFileTool::new(file_deps.clone())));
            tools.extend(plan_tools(&deps.plans));
        }
        WorkerRole::Reviewer => {
            tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
            tools.push(Arc::new(ReadPlanTool::new(deps.plans.clone())));
        }
    }
    tools
}

/// Builds the orchestrator graph for the configured prompt version.
pub fn build_orchestrator(deps: OrchestratorDeps) -> Result<Orchestrator, OrchestratorError> {
    let file_deps = FileToolDeps::new(
        deps.workspace_root.clone(),
        deps.approvals.clone(),
        deps.auto_approve_max_bytes,
    );

    // Supervisor tools: delegation stubs + plan + file + caller extras.
    let mut supervisor_tools: Vec<Arc<dyn Tool>> = WorkerRole::ALL
        .into_iter()
        .map(|role| Arc::new(DelegateTool::new(role)) as Arc<dyn Tool>)
        .collect();
    for tool in &supervisor_tools {
        lint_delegation_spec(&tool.spec()).map_err(OrchestratorError::DelegationLint)?;
    }
    supervisor_tools.extend(plan_tools(&deps.plans));
    supervisor_tools.push(Arc::new(ReadFileTool::new(file_deps.clone())));
    supervisor_tools.push(Arc::new(WriteFileTool::new(file_deps.clone())));
    supervisor_tools.push(Arc::new(EditFileTool::new(file_deps.clone())));
    supervisor_tools.extend(deps.extra_supervisor_tools.iter().cloned());
    let supervisor_registry = Arc::new(ToolRegistry::new_supervisor(supervisor_tools)?);

    let supervisor_prompt = get_prompt(&deps.prompt_version, AgentRole::Supervisor)?;
    let mut graph: StateGraph<OrchestratorState> = StateGraph::new();
    graph.add_node(
        SUPERVISOR_NODE,
        Arc::new(SupervisorNode::new(
            deps.llm_supervisor.clone(),
            supervisor_registry.clone(),
            supervisor_prompt,
        )),
    );
    graph.add_node(
        SUPERVISOR_TOOLS_NODE,
        Arc::new(SupervisorToolsNode::new(
            supervisor_registry,
            deps.approvals.clone(),
        )),
    );

    for role in WorkerRole::ALL {
        let registry = Arc::new(ToolRegistry::new(worker_tools(role, &deps, &file_deps))?);
        let prompt = get_prompt(&deps.prompt_version, AgentRole::Worker(role))?;
        graph.add_node(
            role.node_id(),
            Arc::new(WorkerNode::new(
                role,
                deps.llm_worker.clone(),
                registry,
                deps.plans.clone(),
                deps.cache.clone(),
                deps.approvals.clone(),
                prompt,
                deps.max_worker_turns,
            )),
        );
    }

    graph.add_edge(START, SUPERVISOR_NODE);
    let mut path_map: std::collections::HashMap<String, String> = WorkerRole::ALL
        .iter()
        .map(|r| (r.node_id().to_string(), r.node_id().to_string()))
        .collect();
    path_map.insert(
        SUPERVISOR_TOOLS_NODE.to_string(),
        SUPERVISOR_TOOLS_NODE.to_string(),
    );
    path_map.insert(END.to_string(), END.to_string());
    graph.add_conditional_edges(
        SUPERVISOR_NODE,
        Arc::new(|state: &OrchestratorState| route_supervisor(state).key()),
        Some(path_map),
    );

    let compiled = match deps.checkpointer {
        Some(cp) => graph.compile_with_checkpointer(cp)?,
        None => graph.compile()?,
    };
    Ok(Orchestrator { graph: compiled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCitationCache;
    use crate::llm::{LlmResponse, MockLlm};
    use crate::memory::{MemorySaver, RunConfig};
    use crate::message::ToolInvocation;
    use crate::stream::StreamWriter;
    use crate::tools::{MockSearchProvider, SearchResult};
    use async_trait::async_trait;
    use serde_json::json;
    use stream_event::ProtocolEvent;

    fn test_deps(
        supervisor: MockLlm,
        worker: MockLlm,
        checkpointer: Option<Arc<dyn Checkpointer<OrchestratorState>>>,
    ) -> OrchestratorDeps {
        OrchestratorDeps {
            llm_supervisor: Arc::new(supervisor),
            llm_worker: Arc::new(worker),
            search: Arc::new(MockSearchProvider::new(vec![SearchResult {
                url: "https://a".into(),
                title: "OpenAI".into(),
                content: "GPT-4 is a large multimodal model created by OpenAI.".into(),
                raw_content: String::new(),
                score: 0.9,
                published_date: Some("2023-03-14".into()),
            }])),
            cache: Arc::new(InMemoryCitationCache::new()),
            plans: Arc::new(PlanStore::new()),
            approvals: Arc::new(ApprovalHub::new(300)),
            checkpointer,
            workspace_root: std::env::temp_dir(),
            prompt_version: PromptVersion::benchmark(),
            auto_approve_max_bytes: 1024,
            max_worker_turns: 12,
            extra_supervisor_tools: vec![],
        }
    }

    const REPORT: &str = r#"GPT-4 released in March 2023. "a large multimodal model" [OpenAI, https://a, 2023-03-14] [1]

## Sources
[1] "a large multimodal model" - OpenAI - https://a - 2023-03-14
"#;

    fn delegating_supervisor() -> MockLlm {
        MockLlm::scripted(vec![
            LlmResponse::with_calls(
                "research first",
                vec![ToolInvocation::new(
                    "delegate_to_researcher",
                    json!({
                        "task": "find the GPT-4 release date",
                        "expected_outputs": "cited report",
                        "success_criteria": "all citations verify"
                    }),
                )],
            ),
            LlmResponse::text("GPT-4 released in March 2023, per the researcher's cited report."),
        ])
    }

    fn working_researcher() -> MockLlm {
        MockLlm::scripted(vec![
            LlmResponse::with_calls(
                "planning",
                vec![ToolInvocation::new(
                    "create_research_plan",
                    json!({"steps": [{"description": "find release date"}]}),
                )],
            ),
            LlmResponse::with_calls(
                "",
                vec![
                    ToolInvocation::new(
                        "update_plan_progress",
                        json!({"index": 0, "status": "in_progress"}),
                    ),
                    ToolInvocation::new("search_cached", json!({"query": "gpt-4 release"})),
                    ToolInvocation::new(
                        "update_plan_progress",
                        json!({"index": 0, "status": "completed"}),
                    ),
                    ToolInvocation::new("read_current_plan", json!({})),
                ],
            ),
            LlmResponse::text(REPORT),
        ])
    }

    /// **Scenario**: end to end — supervisor delegates, researcher works to a
    /// verified report, supervisor synthesizes; events arrive in commit
    /// order; when a response is emitted the plan reports all steps done.
    #[tokio::test]
    async fn delegation_roundtrip_end_to_end() {
        let deps = test_deps(delegating_supervisor(), working_researcher(), None);
        let plans = deps.plans.clone();
        let orchestrator = build_orchestrator(deps).unwrap();

        let (tx, mut rx) = tokio::sync::mpsc::channel(256);
        let ctx = RunContext::new(RunConfig::for_session("s1"))
            .with_stream(StreamWriter::new(tx));
        let state = orchestrator
            .run("When did GPT-4 release?", &ctx)
            .await
            .unwrap();

        assert!(state
            .final_response
            .as_deref()
            .unwrap()
            .contains("March 2023"));
        // Property: response emitted => plan has no open steps.
        assert!(plans.get("s1").unwrap().all_steps_done());

        drop(ctx);
        let mut kinds = Vec::new();
        while let Some(ev) = rx.recv().await {
            kinds.push(ev.to_value().unwrap()["type"].as_str().unwrap().to_string());
        }
        // Delegation transition happens before any researcher tool call, and
        // the worker returns before the supervisor synthesis turn.
        let first_transition = kinds.iter().position(|k| k == "worker_transition").unwrap();
        let first_tool_call = kinds.iter().position(|k| k == "tool_call").unwrap();
        assert!(first_transition < first_tool_call);
        assert!(kinds.iter().filter(|k| *k == "worker_transition").count() >= 2);
        assert!(kinds.contains(&"plan_update".to_string()));
    }

    /// **Scenario**: session resumes from checkpoints — a follow-up run on
    /// the same session sees the earlier conversation without re-delegating.
    #[tokio::test]
    async fn follow_up_resumes_from_checkpoint() {
        let saver: Arc<dyn Checkpointer<OrchestratorState>> =
            Arc::new(MemorySaver::<OrchestratorState>::new());
        let supervisor = MockLlm::scripted(vec![
            LlmResponse::text("2 + 2 = 4."),
            LlmResponse::text("You asked about 2+2 earlier; the answer is 4."),
        ]);
        let deps = test_deps(supervisor, MockLlm::fixed(""), Some(saver));
        let orchestrator = build_orchestrator(deps).unwrap();

        let ctx = RunContext::new(RunConfig::for_session("s1"));
        let first = orchestrator.run("What is 2+2?", &ctx).await.unwrap();
        assert_eq!(first.messages.len(), 2);

        let ctx = RunContext::new(RunConfig::for_session("s1"));
        let second = orchestrator
            .run("What calculation did I ask about before?", &ctx)
            .await
            .unwrap();
        // user, assistant, user, assistant — prior log preserved.
        assert_eq!(second.messages.len(), 4);
        assert!(second
            .final_response
            .as_deref()
            .unwrap()
            .contains("2+2"));
    }

    /// **Scenario**: binding a research tool to the supervisor refuses to
    /// start.
    #[tokio::test]
    async fn forbidden_supervisor_binding_fails_startup() {
        struct RogueSearch;
        #[async_trait]
        impl Tool for RogueSearch {
            fn name(&self) -> &str {
                crate::tools::TOOL_SEARCH_CACHED
            }
            fn spec(&self) -> crate::tools::ToolSpec {
                crate::tools::ToolSpec {
                    name: self.name().to_string(),
                    description: None,
                    input_schema: json!({}),
                }
            }
            async fn call(
                &self,
                _args: serde_json::Value,
                _ctx: &crate::tools::ToolCallContext,
            ) -> Result<crate::tools::ToolCallContent, crate::tools::ToolSourceError> {
                unreachable!("never runs: binding fails at startup")
            }
        }

        let mut deps = test_deps(MockLlm::fixed(""), MockLlm::fixed(""), None);
        deps.extra_supervisor_tools = vec![Arc::new(RogueSearch)];
        let err = build_orchestrator(deps).err().expect("startup must fail");
        assert!(matches!(
            err,
            OrchestratorError::Registry(RegistryError::ForbiddenSupervisorTool(_))
        ));
    }

    /// **Scenario**: a cancelled context stops the run at the next boundary
    /// with no LLM calls issued afterwards.
    #[tokio::test]
    async fn cancellation_stops_run() {
        let deps = test_deps(delegating_supervisor(), working_researcher(), None);
        let orchestrator = build_orchestrator(deps).unwrap();
        let ctx = RunContext::new(RunConfig::for_session("s1"));
        ctx.cancel.cancel();
        let err = orchestrator.run("query", &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}
