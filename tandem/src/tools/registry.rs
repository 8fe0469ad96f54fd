//! Per-role tool registry with startup validation.
//!
//! Each agent role gets a frozen registry of the tools it may call. The
//! supervisor's registry must never contain research tools; binding one is a
//! startup error, not a runtime surprise.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use super::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

/// Tools that must never be bound to the supervisor.
pub const SUPERVISOR_FORBIDDEN_TOOLS: [&str; 2] =
    [super::TOOL_SEARCH_CACHED, super::TOOL_VERIFY_CITATIONS];

/// Startup errors from registry construction.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate tool name: {0}")]
    DuplicateTool(String),
    #[error("research tool bound to supervisor: {0}")]
    ForbiddenSupervisorTool(String),
}

/// Frozen set of tools for one agent role.
///
/// Calls to names outside the set return a structured
/// `ToolSourceError::NotFound` the agent can recover from.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, for a stable LLM tool list.
    order: Vec<String>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("order", &self.order)
            .finish()
    }
}

impl ToolRegistry {
    /// Builds a registry from a tool list. Duplicate names are a startup error.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        let mut map = HashMap::new();
        let mut order = Vec::new();
        for tool in tools {
            let name = tool.name().to_string();
            if map.insert(name.clone(), tool).is_some() {
                return Err(RegistryError::DuplicateTool(name));
            }
            order.push(name);
        }
        Ok(Self { tools: map, order })
    }

    /// Builds the supervisor registry, rejecting forbidden research tools.
    pub fn new_supervisor(tools: Vec<Arc<dyn Tool>>) -> Result<Self, RegistryError> {
        for tool in &tools {
            if SUPERVISOR_FORBIDDEN_TOOLS.contains(&tool.name()) {
                return Err(RegistryError::ForbiddenSupervisorTool(
                    tool.name().to_string(),
                ));
            }
        }
        Self::new(tools)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Tool specs in registration order, for the LLM tool list.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| t.spec()))
            .collect()
    }

    /// Calls a tool by name. Names outside the bound set return `NotFound`
    /// listing the available tools, so the agent can choose another. Breaching
    /// the per-kind timeout is a structured transport error, not a
    /// stream-killing exception.
    pub async fn call(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let tool = self.tools.get(name).ok_or_else(|| {
            ToolSourceError::NotFound(format!(
                "{name} (available: {})",
                self.order.join(", ")
            ))
        })?;
        match call_timeout(name) {
            Some(limit) => tokio::time::timeout(limit, tool.call(args, ctx))
                .await
                .map_err(|_| {
                    ToolSourceError::Transport(format!(
                        "{name} timed out after {}s",
                        limit.as_secs()
                    ))
                })?,
            None => tool.call(args, ctx).await,
        }
    }
}

/// Per-kind tool timeout. Approval-gated tools have no registry timeout:
/// the approval TTL is their clock.
fn call_timeout(name: &str) -> Option<std::time::Duration> {
    use std::time::Duration;
    match name {
        super::TOOL_SEARCH_CACHED => Some(Duration::from_secs(90)),
        super::TOOL_VERIFY_CITATIONS | super::TOOL_GET_CACHED_SOURCE => {
            Some(Duration::from_secs(15))
        }
        super::TOOL_WRITE_FILE | super::TOOL_EDIT_FILE => None,
        _ => Some(Duration::from_secs(30)),
    }
}
