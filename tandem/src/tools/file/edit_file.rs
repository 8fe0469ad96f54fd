//! Edit-file tool: replace an exact substring in a workspace file, approval-gated.

use async_trait::async_trait;
use serde_json::json;

use crate::approval::ApprovalKind;
use crate::tools::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_in_workspace;
use super::{approve_or_deny, FileToolDeps};

/// Tool name for editing a file.
pub const TOOL_EDIT_FILE: &str = "edit_file";

pub struct EditFileTool {
    deps: FileToolDeps,
}

impl EditFileTool {
    pub fn new(deps: FileToolDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Tool for EditFileTool {
    fn name(&self) -> &str {
        TOOL_EDIT_FILE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_EDIT_FILE.to_string(),
            description: Some(
                "Replace an exact text span in a workspace file. Pauses for user \
                 approval; the old text must occur exactly once."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Workspace-relative path" },
                    "old_text": { "type": "string", "description": "Exact text to replace" },
                    "new_text": { "type": "string", "description": "Replacement text" }
                },
                "required": ["path", "old_text", "new_text"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let raw = required_str(&args, "path")?;
        let old_text = required_str(&args, "old_text")?;
        let new_text = required_str(&args, "new_text")?;
        let path = resolve_in_workspace(&self.deps.workspace_root, raw)?;

        let current = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ToolSourceError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        let matches = current.matches(old_text).count();
        if matches == 0 {
            return Err(ToolSourceError::InvalidInput(
                "old_text not found in file".to_string(),
            ));
        }
        if matches > 1 {
            return Err(ToolSourceError::InvalidInput(format!(
                "old_text occurs {matches} times; provide a unique span"
            )));
        }

        let diff = format!("- {}\n+ {}", old_text, new_text);
        approve_or_deny(
            &self.deps,
            ctx,
            ApprovalKind::EditFile,
            raw,
            None,
            Some(diff),
        )
        .await?;

        let updated = current.replacen(old_text, new_text, 1);
        tokio::fs::write(&path, &updated).await.map_err(|e| {
            ToolSourceError::Transport(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(ToolCallContent {
            text: format!("edited {raw}"),
        })
    }
}
