//! HTTP round-trips over an ephemeral listener.

use std::sync::Arc;

use tandem::agent::{build_orchestrator, OrchestratorDeps};
use tandem::approval::ApprovalHub;
use tandem::cache::InMemoryCitationCache;
use tandem::llm::MockLlm;
use tandem::plan::Plan;
use tandem::prompts::PromptVersion;
use tandem::tools::{MockSearchProvider, PlanStore};

async fn spawn_server(plans: Arc<PlanStore>) -> String {
    let approvals = Arc::new(ApprovalHub::new(300));
    let deps = OrchestratorDeps {
        llm_supervisor: Arc::new(MockLlm::fixed("a direct answer")),
        llm_worker: Arc::new(MockLlm::fixed("")),
        search: Arc::new(MockSearchProvider::default()),
        cache: Arc::new(InMemoryCitationCache::new()),
        plans: plans.clone(),
        approvals: approvals.clone(),
        checkpointer: None,
        workspace_root: std::env::temp_dir(),
        prompt_version: PromptVersion::benchmark(),
        auto_approve_max_bytes: 1024,
        max_worker_turns: 4,
        extra_supervisor_tools: vec![],
    };
    let state = serve::AppState::new(
        Arc::new(build_orchestrator(deps).unwrap()),
        approvals,
        plans,
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, serve::build_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

/// **Scenario**: POST /chat returns an NDJSON stream whose final line is
/// stream_complete{success:true}.
#[tokio::test]
async fn chat_streams_ndjson() {
    let base = spawn_server(Arc::new(PlanStore::new())).await;
    let body = reqwest::Client::new()
        .post(format!("{base}/chat"))
        .json(&serde_json::json!({"message": "hello", "session_id": "s1"}))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    let lines: Vec<serde_json::Value> = body
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert!(!lines.is_empty());
    let last = lines.last().unwrap();
    assert_eq!(last["type"], "stream_complete");
    assert_eq!(last["success"], true);
    assert_eq!(last["session_id"], "s1");
    assert_eq!(
        lines
            .iter()
            .filter(|l| l["type"] == "stream_complete")
            .count(),
        1
    );
}

/// **Scenario**: the plan snapshot endpoint reads session plans and answers
/// null for unknown sessions.
#[tokio::test]
async fn plan_snapshot_endpoint() {
    let plans = Arc::new(PlanStore::new());
    plans.install(
        "s1",
        Plan::new(vec![("find".into(), "search".into())]).unwrap(),
    );
    let base = spawn_server(plans).await;
    let client = reqwest::Client::new();

    let with_plan: serde_json::Value = client
        .get(format!("{base}/plan/s1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(with_plan["all_steps_completed"], false);
    assert_eq!(with_plan["plan"]["steps"][0]["status"], "pending");

    let unknown: serde_json::Value = client
        .get(format!("{base}/plan/ghost"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(unknown["plan"].is_null());
}

/// **Scenario**: resolving an unknown approval id answers 404.
#[tokio::test]
async fn approval_endpoint_unknown_is_404() {
    let base = spawn_server(Arc::new(PlanStore::new())).await;
    let status = reqwest::Client::new()
        .post(format!("{base}/approvals"))
        .json(&serde_json::json!({
            "session_id": "nobody",
            "approval_id": "missing",
            "decision": "approve"
        }))
        .send()
        .await
        .unwrap()
        .status();
    assert_eq!(status.as_u16(), 404);
}
