//! # Tandem
//!
//! Hierarchical multi-agent research orchestration in Rust, with a
//! **state-in, state-out** graph design: one shared state type flows through
//! nodes, checkpointed at every boundary and keyed by session.
//!
//! A user query is planned by a supervisor, delegated to specialized workers
//! (researcher, data scientist, expert analyst, writer, reviewer), verified
//! against a session-scoped citation cache, and synthesized into a final
//! reply while a typed event stream keeps the client informed — including
//! human-in-the-loop approval of file writes.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`],
//!   [`RunContext`] — build and run state graphs with per-boundary
//!   checkpointing and cancellation.
//! - [`agent`]: supervisor, workers, delegation router, and
//!   [`agent::Orchestrator`] assembly with startup validation.
//! - [`tools`]: session-aware tools ([`Tool`], [`ToolRegistry`]) — cached
//!   search, citation verification, file tools behind approvals, plan tools.
//! - [`cache`]: session-scoped citation cache ([`CitationCache`],
//!   [`SqliteCitationCache`], [`InMemoryCitationCache`]).
//! - [`memory`]: checkpointing ([`Checkpointer`], [`MemorySaver`],
//!   [`SqliteSaver`], [`RunConfig`]).
//! - [`approval`]: the human-in-the-loop queue and policy.
//! - [`llm`]: [`LlmClient`] trait with [`MockLlm`] and [`ChatOpenAI`].
//! - [`prompts`]: first-class prompt versions via [`prompts::get_prompt`].
//! - [`plan`], [`citation`], [`message`], [`stream`]: the data model.
//!
//! Key types are re-exported at the crate root.

pub mod agent;
pub mod approval;
pub mod cache;
pub mod citation;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod plan;
pub mod prompts;
pub mod stream;
pub mod tools;

pub use agent::{
    build_orchestrator, Orchestrator, OrchestratorDeps, OrchestratorError, OrchestratorState,
    SessionRegistry, WorkerOutcome,
};
pub use agent::{route_supervisor, AgentRole, SupervisorRoute, WorkerRole};
pub use approval::{
    ApprovalDecision, ApprovalError, ApprovalHub, ApprovalKind, ApprovalOutcome, ApprovalPolicy,
    ApprovalQueue, ApprovalRequest, ApprovalStatus,
};
pub use cache::{CacheError, CachedSource, CitationCache, InMemoryCitationCache, SqliteCitationCache};
pub use citation::{
    collapse_whitespace, normalize_for_match, parse_inline_citations, parse_source_list, Citation,
    CitationError, InlineCitation,
};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, ConditionalRouter, Next, Node, RunContext, StateGraph,
    END, START,
};
pub use llm::{ChatOpenAI, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use memory::{
    Checkpoint, CheckpointError, CheckpointListItem, CheckpointMetadata, CheckpointSource,
    Checkpointer, MemorySaver, RunConfig, SqliteSaver,
};
pub use message::{last_assistant_reply, Message, ToolInvocation};
pub use plan::{planning_required, Plan, PlanError, PlanStep, StepStatus};
pub use prompts::{get_prompt, known_versions, PromptError, PromptVersion};
pub use stream::StreamWriter;
pub use tools::{
    CreatePlanTool, EditFileTool, EditPlanTool, FileToolDeps, GetCachedSourceTool,
    MockSearchProvider, PlanStore, ReadFileTool, ReadPlanTool, RegistryError, SearchCachedTool,
    SearchDepth, SearchProvider, SearchResult, TavilySearch, Tool, ToolCallContent,
    ToolCallContext, ToolRegistry, ToolSourceError, ToolSpec, UpdatePlanProgressTool,
    VerifyCitationsTool, WriteFileTool, SUPERVISOR_FORBIDDEN_TOOLS,
};

/// When running `cargo test -p tandem`, initializes tracing from `RUST_LOG` so
/// unit tests in `src/**` can print logs with `--nocapture`.
#[cfg(test)]
mod test_logging {
    use ctor::ctor;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::Layer;

    #[ctor]
    fn init() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_filter(filter),
            )
            .try_init();
    }
}
