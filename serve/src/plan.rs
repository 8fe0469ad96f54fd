//! `GET /plan/:session_id`: read-only plan snapshot for UI observation.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::app::AppState;

pub(crate) async fn snapshot(
    State(app): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<serde_json::Value> {
    match app.plans.get(&session_id) {
        Some(plan) => Json(json!({
            "session_id": session_id,
            "plan": plan.snapshot(),
            "all_steps_completed": plan.all_steps_done(),
        })),
        None => Json(json!({
            "session_id": session_id,
            "plan": null,
            "all_steps_completed": false,
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tandem::agent::{build_orchestrator, OrchestratorDeps};
    use tandem::approval::ApprovalHub;
    use tandem::cache::InMemoryCitationCache;
    use tandem::llm::MockLlm;
    use tandem::plan::Plan;
    use tandem::tools::{MockSearchProvider, PlanStore};

    fn app_with_plans(plans: Arc<PlanStore>) -> AppState {
        let hub = Arc::new(ApprovalHub::new(300));
        let deps = OrchestratorDeps {
            llm_supervisor: Arc::new(MockLlm::fixed("")),
            llm_worker: Arc::new(MockLlm::fixed("")),
            search: Arc::new(MockSearchProvider::default()),
            cache: Arc::new(InMemoryCitationCache::new()),
            plans: plans.clone(),
            approvals: hub.clone(),
            checkpointer: None,
            workspace_root: std::env::temp_dir(),
            prompt_version: tandem::prompts::PromptVersion::benchmark(),
            auto_approve_max_bytes: 1024,
            max_worker_turns: 4,
            extra_supervisor_tools: vec![],
        };
        AppState::new(Arc::new(build_orchestrator(deps).unwrap()), hub, plans)
    }

    /// **Scenario**: sessions with and without a plan both answer; the
    /// endpoint never mutates anything.
    #[tokio::test]
    async fn snapshot_readback() {
        let plans = Arc::new(PlanStore::new());
        plans.install(
            "s1",
            Plan::new(vec![("find".into(), "search".into())]).unwrap(),
        );
        let app = app_with_plans(plans.clone());

        let Json(with_plan) = snapshot(State(app.clone()), Path("s1".into())).await;
        assert_eq!(with_plan["all_steps_completed"], false);
        assert!(with_plan["plan"]["steps"].is_array());

        let Json(without) = snapshot(State(app), Path("s2".into())).await;
        assert!(without["plan"].is_null());
        assert!(plans.get("s1").is_some());
    }
}
