//! Session-aware tools: the trait layer plus every tool workers and the
//! supervisor can invoke.
//!
//! Tools are constructed with their shared dependencies (cache, provider,
//! plan store, approval hub) and receive per-call data through
//! [`ToolCallContext`] — most importantly the `session_id` that namespaces
//! every store. Tool failures are structured errors fed back to the agent as
//! tool results; they never kill the graph step.

mod context;
mod file;
mod plan;
mod registry;
mod search;
mod source_lookup;
mod verify;

pub use context::ToolCallContext;
pub use file::{
    EditFileTool, FileToolDeps, ReadFileTool, WriteFileTool, TOOL_EDIT_FILE, TOOL_READ_FILE,
    TOOL_WRITE_FILE,
};
pub use plan::{
    CreatePlanTool, EditPlanTool, PlanStore, ReadPlanTool, UpdatePlanProgressTool,
    TOOL_CREATE_PLAN, TOOL_EDIT_PLAN, TOOL_READ_PLAN, TOOL_UPDATE_PLAN_PROGRESS,
};
pub use registry::{RegistryError, ToolRegistry, SUPERVISOR_FORBIDDEN_TOOLS};
pub use search::{
    MockSearchProvider, SearchCachedTool, SearchDepth, SearchProvider, SearchResult, TavilySearch,
    TOOL_SEARCH_CACHED,
};
pub use source_lookup::{GetCachedSourceTool, TOOL_GET_CACHED_SOURCE};
pub use verify::{VerifyCitationsTool, TOOL_VERIFY_CITATIONS};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Tool specification: name, description for the LLM, JSON schema for args.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: Option<String>,
    pub input_schema: Value,
}

/// Result of a single tool call.
///
/// **Interaction**: returned by `Tool::call`; agent nodes write this into a
/// `Message::Tool` answering the invocation id.
#[derive(Debug, Clone)]
pub struct ToolCallContent {
    /// Result text handed back to the agent.
    pub text: String,
}

/// Errors from calling tools. All variants are agent-recoverable: they become
/// structured tool error results, not stream-killing exceptions.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    /// Tool is not in the invoking agent's bound set.
    #[error("tool not found: {0}")]
    NotFound(String),
    /// Malformed arguments, plan index out of range, malformed citation block.
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    /// Provider failure, timeout, retry exhaustion.
    #[error("transport error: {0}")]
    Transport(String),
    /// Path escape, approval rejected, approval expired.
    #[error("not permitted: {0}")]
    Denied(String),
}

/// A single tool callable by an agent.
///
/// Each tool has a unique name, a spec (description + JSON schema), and the
/// call logic. Tools are registered into a per-role [`ToolRegistry`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name as exposed to the LLM.
    fn name(&self) -> &str;

    /// Specification used to build the LLM tool list.
    fn spec(&self) -> ToolSpec;

    /// Executes the tool with JSON arguments and per-call context.
    async fn call(
        &self,
        args: Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError>;
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolSourceError> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("missing or invalid '{key}'")))
}

/// Reads a required non-negative integer argument.
pub(crate) fn required_index(args: &Value, key: &str) -> Result<usize, ToolSourceError> {
    args.get(key)
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("missing or invalid '{key}'")))
}
