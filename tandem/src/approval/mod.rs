//! Human-in-the-loop approval queue for write/edit operations.
//!
//! Protocol per write/edit invocation: submit a request (emits
//! `approval_request` upstream), suspend the invoking agent on the decision
//! channel, then approve → execute, reject → structured tool error, timeout →
//! expired (equivalent to rejection). `approval_resolved` is emitted for every
//! request before the stream completes.
//!
//! Queues are session-local. Auto-approval is a policy decision made before
//! the queue is consulted: write/edit below the size threshold only, never
//! delete-class operations, never paths outside the sandbox (those are
//! rejected by the path layer before approval is considered).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{oneshot, Mutex};

/// Errors from approval queue operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    #[error("unknown approval id: {0}")]
    UnknownId(String),
    #[error("approval {0} already resolved")]
    AlreadyResolved(String),
    #[error("approval {0} expired")]
    Expired(String),
}

/// Kind of gated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    WriteFile,
    EditFile,
}

impl ApprovalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalKind::WriteFile => "write_file",
            ApprovalKind::EditFile => "edit_file",
        }
    }
}

/// Status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// Caller decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

/// Outcome observed by the suspended tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    Rejected,
    Expired,
}

impl ApprovalOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalOutcome::Approved => "approved",
            ApprovalOutcome::Rejected => "rejected",
            ApprovalOutcome::Expired => "expired",
        }
    }
}

/// One approval request, session-scoped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: String,
    pub session_id: String,
    pub kind: ApprovalKind,
    pub target_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
    pub created_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub status: ApprovalStatus,
}

impl ApprovalRequest {
    fn is_past_ttl(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age.num_seconds() >= self.ttl_seconds as i64
    }
}

struct PendingEntry {
    request: ApprovalRequest,
    decision_tx: Option<oneshot::Sender<ApprovalDecision>>,
}

/// Session-local approval queue.
///
/// The invoking tool holds the receiver half returned by [`submit`] and awaits
/// it with the request TTL; the serve layer resolves by id. Requests never
/// auto-approve here; bypass happens in [`ApprovalPolicy`] before submission.
///
/// [`submit`]: ApprovalQueue::submit
pub struct ApprovalQueue {
    session_id: String,
    ttl_seconds: u64,
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl ApprovalQueue {
    pub fn new(session_id: impl Into<String>, ttl_seconds: u64) -> Self {
        Self {
            session_id: session_id.into(),
            ttl_seconds,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    /// Registers a new pending request and returns it with the decision
    /// receiver the invoking agent suspends on.
    pub async fn submit(
        &self,
        kind: ApprovalKind,
        target_path: impl Into<String>,
        proposed_content: Option<String>,
        diff: Option<String>,
    ) -> (ApprovalRequest, oneshot::Receiver<ApprovalDecision>) {
        let (tx, rx) = oneshot::channel();
        let request = ApprovalRequest {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id.clone(),
            kind,
            target_path: target_path.into(),
            proposed_content,
            diff,
            created_at: Utc::now(),
            ttl_seconds: self.ttl_seconds,
            status: ApprovalStatus::Pending,
        };
        self.entries.lock().await.insert(
            request.id.clone(),
            PendingEntry {
                request: request.clone(),
                decision_tx: Some(tx),
            },
        );
        (request, rx)
    }

    /// Resolves a pending request. Unknown ids, already-resolved requests, and
    /// TTL-expired requests are distinct errors (404 / 404 / 410 upstream).
    pub async fn resolve(
        &self,
        approval_id: &str,
        decision: ApprovalDecision,
    ) -> Result<(), ApprovalError> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(approval_id)
            .ok_or_else(|| ApprovalError::UnknownId(approval_id.to_string()))?;
        match entry.request.status {
            ApprovalStatus::Pending => {}
            ApprovalStatus::Expired => return Err(ApprovalError::Expired(approval_id.to_string())),
            _ => return Err(ApprovalError::AlreadyResolved(approval_id.to_string())),
        }
        if entry.request.is_past_ttl(Utc::now()) {
            entry.request.status = ApprovalStatus::Expired;
            entry.decision_tx.take();
            return Err(ApprovalError::Expired(approval_id.to_string()));
        }
        entry.request.status = match decision {
            ApprovalDecision::Approve => ApprovalStatus::Approved,
            ApprovalDecision::Reject => ApprovalStatus::Rejected,
        };
        if let Some(tx) = entry.decision_tx.take() {
            let _ = tx.send(decision);
        }
        Ok(())
    }

    /// Awaits the decision for a submitted request, enforcing the TTL.
    /// Expiry marks the request and is equivalent to rejection.
    pub async fn wait(
        &self,
        approval_id: &str,
        rx: oneshot::Receiver<ApprovalDecision>,
    ) -> ApprovalOutcome {
        let ttl = std::time::Duration::from_secs(self.ttl_seconds);
        match tokio::time::timeout(ttl, rx).await {
            Ok(Ok(ApprovalDecision::Approve)) => ApprovalOutcome::Approved,
            Ok(Ok(ApprovalDecision::Reject)) => ApprovalOutcome::Rejected,
            // Sender dropped (queue flushed) counts as rejection.
            Ok(Err(_)) => ApprovalOutcome::Rejected,
            Err(_) => {
                let mut entries = self.entries.lock().await;
                if let Some(entry) = entries.get_mut(approval_id) {
                    if entry.request.status == ApprovalStatus::Pending {
                        entry.request.status = ApprovalStatus::Expired;
                        entry.decision_tx.take();
                    }
                }
                ApprovalOutcome::Expired
            }
        }
    }

    /// Marks every pending request past its TTL as expired, dropping its
    /// decision channel. Returns the ids flushed.
    pub async fn expire_stale(&self) -> Vec<String> {
        let now = Utc::now();
        let mut flushed = Vec::new();
        let mut entries = self.entries.lock().await;
        for entry in entries.values_mut() {
            if entry.request.status == ApprovalStatus::Pending && entry.request.is_past_ttl(now) {
                entry.request.status = ApprovalStatus::Expired;
                entry.decision_tx.take();
                flushed.push(entry.request.id.clone());
            }
        }
        flushed
    }

    /// Snapshot of all requests for this session (for diagnostics).
    pub async fn snapshot(&self) -> Vec<ApprovalRequest> {
        let entries = self.entries.lock().await;
        let mut list: Vec<ApprovalRequest> =
            entries.values().map(|e| e.request.clone()).collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        list
    }
}

/// Registry of per-session approval queues.
///
/// File tools and the serve layer share one hub: tools submit through the
/// session's queue, the approval endpoint resolves through the same queue.
pub struct ApprovalHub {
    queues: dashmap::DashMap<String, std::sync::Arc<ApprovalQueue>>,
    ttl_seconds: u64,
}

impl ApprovalHub {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            queues: dashmap::DashMap::new(),
            ttl_seconds,
        }
    }

    /// Queue for a session, created on first use.
    pub fn queue_for(&self, session_id: &str) -> std::sync::Arc<ApprovalQueue> {
        self.queues
            .entry(session_id.to_string())
            .or_insert_with(|| {
                std::sync::Arc::new(ApprovalQueue::new(session_id, self.ttl_seconds))
            })
            .clone()
    }

    /// Queue for a session if one exists (for the approval endpoint).
    pub fn existing_queue(&self, session_id: &str) -> Option<std::sync::Arc<ApprovalQueue>> {
        self.queues.get(session_id).map(|q| q.clone())
    }
}

/// Auto-approval policy: bypass the wait for small write/edit operations.
///
/// Never applies to delete-class operations or paths outside the workspace
/// sandbox; the path layer rejects sandbox escapes before approval is
/// consulted, and no delete tool exists in the tool surface.
#[derive(Debug, Clone, Copy)]
pub struct ApprovalPolicy {
    pub auto_approve: bool,
    pub max_bytes: usize,
}

impl ApprovalPolicy {
    pub fn new(auto_approve: bool, max_bytes: usize) -> Self {
        Self {
            auto_approve,
            max_bytes,
        }
    }

    /// True when this operation may execute without waiting for a decision.
    pub fn allows_bypass(&self, _kind: ApprovalKind, content_bytes: usize) -> bool {
        self.auto_approve && content_bytes <= self.max_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: approve resolves the waiting invocation.
    #[tokio::test]
    async fn approve_roundtrip() {
        let queue = ApprovalQueue::new("s1", 300);
        let (request, rx) = queue
            .submit(ApprovalKind::WriteFile, "notes.md", Some("content".into()), None)
            .await;
        assert_eq!(request.status, ApprovalStatus::Pending);

        queue
            .resolve(&request.id, ApprovalDecision::Approve)
            .await
            .unwrap();
        let outcome = queue.wait(&request.id, rx).await;
        assert_eq!(outcome, ApprovalOutcome::Approved);
        let snap = queue.snapshot().await;
        assert_eq!(snap[0].status, ApprovalStatus::Approved);
    }

    /// **Scenario**: reject resolves with a rejection outcome.
    #[tokio::test]
    async fn reject_roundtrip() {
        let queue = ApprovalQueue::new("s1", 300);
        let (request, rx) = queue
            .submit(ApprovalKind::EditFile, "doc.md", None, Some("diff".into()))
            .await;
        queue
            .resolve(&request.id, ApprovalDecision::Reject)
            .await
            .unwrap();
        assert_eq!(queue.wait(&request.id, rx).await, ApprovalOutcome::Rejected);
    }

    /// **Scenario**: double resolution and unknown ids are distinct errors.
    #[tokio::test]
    async fn resolve_error_cases() {
        let queue = ApprovalQueue::new("s1", 300);
        let (request, _rx) = queue
            .submit(ApprovalKind::WriteFile, "f.md", None, None)
            .await;
        queue
            .resolve(&request.id, ApprovalDecision::Approve)
            .await
            .unwrap();
        assert!(matches!(
            queue.resolve(&request.id, ApprovalDecision::Approve).await,
            Err(ApprovalError::AlreadyResolved(_))
        ));
        assert!(matches!(
            queue.resolve("nope", ApprovalDecision::Approve).await,
            Err(ApprovalError::UnknownId(_))
        ));
    }

    /// **Scenario**: a zero-TTL request expires on wait; resolving it
    /// afterwards reports Expired.
    #[tokio::test]
    async fn ttl_expiry() {
        let queue = ApprovalQueue::new("s1", 0);
        let (request, rx) = queue
            .submit(ApprovalKind::WriteFile, "f.md", None, None)
            .await;
        assert_eq!(queue.wait(&request.id, rx).await, ApprovalOutcome::Expired);
        assert!(matches!(
            queue.resolve(&request.id, ApprovalDecision::Approve).await,
            Err(ApprovalError::Expired(_))
        ));
    }

    /// **Scenario**: expire_stale flushes only pending, past-TTL entries.
    #[tokio::test]
    async fn expire_stale_flushes_pending() {
        let queue = ApprovalQueue::new("s1", 0);
        let (stale, _rx) = queue
            .submit(ApprovalKind::WriteFile, "f.md", None, None)
            .await;
        let flushed = queue.expire_stale().await;
        assert_eq!(flushed, vec![stale.id.clone()]);
        // Second pass flushes nothing new.
        assert!(queue.expire_stale().await.is_empty());
    }

    /// **Scenario**: policy bypasses only small operations with the flag on.
    #[test]
    fn policy_bypass_rules() {
        let policy = ApprovalPolicy::new(true, 1024);
        assert!(policy.allows_bypass(ApprovalKind::WriteFile, 100));
        assert!(!policy.allows_bypass(ApprovalKind::WriteFile, 4096));
        let off = ApprovalPolicy::new(false, 1024);
        assert!(!off.allows_bypass(ApprovalKind::EditFile, 10));
    }
}
