//! Read-file tool: return the contents of a workspace file.

use async_trait::async_trait;
use serde_json::json;

use crate::tools::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_in_workspace;
use super::FileToolDeps;

/// Tool name for reading a file.
pub const TOOL_READ_FILE: &str = "read_file";

pub struct ReadFileTool {
    deps: FileToolDeps,
}

impl ReadFileTool {
    pub fn new(deps: FileToolDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        TOOL_READ_FILE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_READ_FILE.to_string(),
            description: Some("Read a file from the workspace.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Workspace-relative path" }
                },
                "required": ["path"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        _ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let raw = required_str(&args, "path")?;
        let path = resolve_in_workspace(&self.deps.workspace_root, raw)?;
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ToolSourceError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(ToolCallContent { text })
    }
}
