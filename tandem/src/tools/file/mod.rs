//! Workspace file tools: read, write, edit.
//!
//! All paths are workspace-relative; escapes are rejected before anything
//! else runs. Writes and edits go through the human-in-the-loop approval
//! protocol: emit `approval_request`, suspend on the decision, then execute
//! on approve, return a structured error on reject, treat TTL expiry as
//! rejection. Auto-approve bypasses the wait below the size threshold but
//! still emits the request/resolved event pair.

mod edit_file;
mod path;
mod read_file;
mod write_file;

pub use edit_file::{EditFileTool, TOOL_EDIT_FILE};
pub use read_file::{ReadFileTool, TOOL_READ_FILE};
pub use write_file::{WriteFileTool, TOOL_WRITE_FILE};

use std::path::PathBuf;
use std::sync::Arc;

use stream_event::ProtocolEvent;

use crate::approval::{
    ApprovalHub, ApprovalKind, ApprovalOutcome, ApprovalPolicy, ApprovalRequest,
};

use super::{ToolCallContext, ToolSourceError};

/// Shared dependencies for the file tools.
#[derive(Clone)]
pub struct FileToolDeps {
    /// Sandbox root; every tool path resolves inside it.
    pub workspace_root: Arc<PathBuf>,
    /// Per-session approval queues.
    pub approvals: Arc<ApprovalHub>,
    /// Size threshold for the auto-approve bypass.
    pub auto_approve_max_bytes: usize,
}

impl FileToolDeps {
    pub fn new(
        workspace_root: impl Into<PathBuf>,
        approvals: Arc<ApprovalHub>,
        auto_approve_max_bytes: usize,
    ) -> Self {
        Self {
            workspace_root: Arc::new(workspace_root.into()),
            approvals,
            auto_approve_max_bytes,
        }
    }
}

/// Runs the approval protocol for one gated operation and returns the final
/// request snapshot on approval. Rejection and expiry are `Denied` errors the
/// invoking agent receives as a tool result.
pub(crate) async fn approve_or_deny(
    deps: &FileToolDeps,
    ctx: &ToolCallContext,
    kind: ApprovalKind,
    target_path: &str,
    proposed_content: Option<String>,
    diff: Option<String>,
) -> Result<ApprovalRequest, ToolSourceError> {
    let queue = deps.approvals.queue_for(&ctx.session_id);
    let content_bytes = proposed_content
        .as_deref()
        .or(diff.as_deref())
        .map(str::len)
        .unwrap_or(0);
    let policy = ApprovalPolicy::new(ctx.auto_approve, deps.auto_approve_max_bytes);

    let (request, rx) = queue
        .submit(kind, target_path, proposed_content, diff)
        .await;
    ctx.stream
        .emit(ProtocolEvent::ApprovalRequest {
            approval_id: request.id.clone(),
            kind: kind.as_str().to_string(),
            target_path: target_path.to_string(),
            proposed_content: request.proposed_content.clone(),
            diff: request.diff.clone(),
            ttl_seconds: request.ttl_seconds,
        })
        .await;

    let outcome = if policy.allows_bypass(kind, content_bytes) {
        // Resolve our own request so the queue records a terminal status.
        let _ = queue
            .resolve(&request.id, crate::approval::ApprovalDecision::Approve)
            .await;
        ApprovalOutcome::Approved
    } else {
        queue.wait(&request.id, rx).await
    };

    ctx.stream
        .emit(ProtocolEvent::ApprovalResolved {
            approval_id: request.id.clone(),
            decision: outcome.as_str().to_string(),
        })
        .await;

    match outcome {
        ApprovalOutcome::Approved => Ok(request),
        ApprovalOutcome::Rejected => Err(ToolSourceError::Denied(format!(
            "approval rejected for {} {}",
            kind.as_str(),
            target_path
        ))),
        ApprovalOutcome::Expired => Err(ToolSourceError::Denied(format!(
            "approval expired for {} {}",
            kind.as_str(),
            target_path
        ))),
    }
}
