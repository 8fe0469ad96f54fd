//! Agents: supervisor, workers, delegation routing, and graph assembly.
//!
//! The orchestrator is a cyclic graph
//! `supervisor → (worker | supervisor_tools) → supervisor → … → end`
//! over [`OrchestratorState`], with the router a pure function of the latest
//! supervisor message. [`build_orchestrator`] wires role tool sets with
//! startup validation and compiles the graph, optionally with a
//! checkpointer for resumable sessions.

mod delegate;
mod loop_detect;
mod orchestrator;
pub mod role;
mod router;
mod session;
mod state;
mod supervisor;
mod supervisor_tools;
mod worker;

pub use delegate::{lint_delegation_spec, parse_delegation, DelegateTool};
pub use loop_detect::{LoopDetector, LoopVerdict};
pub use orchestrator::{build_orchestrator, Orchestrator, OrchestratorDeps, OrchestratorError};
pub use role::{AgentRole, WorkerRole};
pub use router::{route_supervisor, SupervisorRoute};
pub use session::SessionRegistry;
pub use state::{Delegation, OrchestratorState};
pub use supervisor::{SupervisorNode, SUPERVISOR_NODE};
pub use supervisor_tools::{SupervisorToolsNode, SUPERVISOR_TOOLS_NODE};
pub use worker::{WorkerNode, WorkerOutcome};
