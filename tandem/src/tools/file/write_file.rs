//! Write-file tool: create or overwrite a workspace file, approval-gated.

use async_trait::async_trait;
use serde_json::json;

use crate::approval::ApprovalKind;
use crate::tools::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::path::resolve_in_workspace;
use super::{approve_or_deny, FileToolDeps};

/// Tool name for writing a file.
pub const TOOL_WRITE_FILE: &str = "write_file";

pub struct WriteFileTool {
    deps: FileToolDeps,
}

impl WriteFileTool {
    pub fn new(deps: FileToolDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        TOOL_WRITE_FILE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_WRITE_FILE.to_string(),
            description: Some(
                "Write a file in the workspace. Pauses for user approval; a rejection \
                 is final for this attempt."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "path": { "type": "string", "description": "Workspace-relative path" },
                    "content": { "type": "string", "description": "Full file content" }
                },
                "required": ["path", "content"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let raw = required_str(&args, "path")?;
        let content = required_str(&args, "content")?;
        // Sandbox first: escapes never reach the approval layer.
        let path = resolve_in_workspace(&self.deps.workspace_root, raw)?;

        approve_or_deny(
            &self.deps,
            ctx,
            ApprovalKind::WriteFile,
            raw,
            Some(content.to_string()),
            None,
        )
        .await?;

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ToolSourceError::Transport(format!("failed to create parent dir: {e}"))
                })?;
            }
        }
        tokio::fs::write(&path, content).await.map_err(|e| {
            ToolSourceError::Transport(format!("failed to write {}: {}", path.display(), e))
        })?;
        Ok(ToolCallContent {
            text: format!("wrote {} bytes to {}", content.len(), raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{ApprovalDecision, ApprovalHub};
    use std::sync::Arc;

    fn deps(root: &std::path::Path, hub: Arc<ApprovalHub>) -> FileToolDeps {
        FileToolDeps::new(root, hub, 1024)
    }

    /// **Scenario**: an approved write lands on disk.
    #[tokio::test]
    async fn approved_write_lands() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Arc::new(ApprovalHub::new(300));
        let tool = WriteFileTool::new(deps(dir.path(), hub.clone()));
        let ctx = ToolCallContext::new("s2", "writer");

        let hub_for_approver = hub.clone();
        let approver = tokio::spawn(async move {
            // Approve the first pending request once it appears.
            loop {
                let queue = hub_for_approver.queue_for("s2");
                let pending = queue.snapshot().await;
                if let Some(req) = pending.first() {
                    queue
                        .resolve(&req.id, ApprovalDecision::Approve)
                        .await
                        .unwrap();
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        });

        let out = tool
            .call(json!({"path": "qc.md", "content": "quantum summary"}), &ctx)
            .await
            .unwrap();
        approver.await.unwrap();
        assert!(out.text.contains("wrote"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("qc.md")).unwrap(),
            "quantum summary"
        );
    }

    /// **Scenario**: a rejected write leaves the file untouched and returns a
    /// Denied error the agent can report.
    #[tokio::test]
    async fn rejected_write_leaves_file_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Arc::new(ApprovalHub::new(300));
        let tool = WriteFileTool::new(deps(dir.path(), hub.clone()));
        let ctx = ToolCallContext::new("s2", "writer");

        let hub_for_rejecter = hub.clone();
        let rejecter = tokio::spawn(async move {
            loop {
                let queue = hub_for_rejecter.queue_for("s2");
                let pending = queue.snapshot().await;
                if let Some(req) = pending.first() {
                    queue
                        .resolve(&req.id, ApprovalDecision::Reject)
                        .await
                        .unwrap();
                    break;
                }
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        });

        let err = tool
            .call(json!({"path": "qc.md", "content": "nope"}), &ctx)
            .await
            .unwrap_err();
        rejecter.await.unwrap();
        assert!(matches!(err, ToolSourceError::Denied(msg) if msg.contains("rejected")));
        assert!(!dir.path().join("qc.md").exists());
    }

    /// **Scenario**: auto-approve below the threshold executes without a
    /// waiting resolver.
    #[tokio::test]
    async fn auto_approve_bypasses_wait() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Arc::new(ApprovalHub::new(300));
        let tool = WriteFileTool::new(deps(dir.path(), hub.clone()));
        let ctx = ToolCallContext::new("s2", "writer").with_auto_approve(true);

        let out = tool
            .call(json!({"path": "small.md", "content": "tiny"}), &ctx)
            .await
            .unwrap();
        assert!(out.text.contains("small.md"));
        assert!(dir.path().join("small.md").exists());
    }

    /// **Scenario**: auto-approve does not bypass above the size threshold;
    /// with a zero TTL the request expires and the write is denied.
    #[tokio::test]
    async fn auto_approve_respects_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let hub = Arc::new(ApprovalHub::new(0));
        let tool = WriteFileTool::new(FileToolDeps::new(dir.path(), hub, 8));
        let ctx = ToolCallContext::new("s2", "writer").with_auto_approve(true);

        let err = tool
            .call(
                json!({"path": "big.md", "content": "well over eight bytes of content"}),
                &ctx,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolSourceError::Denied(msg) if msg.contains("expired")));
        assert!(!dir.path().join("big.md").exists());
    }
}
