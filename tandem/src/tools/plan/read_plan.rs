//! Read-plan tool: snapshot of the session's current plan.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::tools::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::PlanStore;

/// Tool name for reading the current plan.
pub const TOOL_READ_PLAN: &str = "read_current_plan";

pub struct ReadPlanTool {
    store: Arc<PlanStore>,
}

impl ReadPlanTool {
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for ReadPlanTool {
    fn name(&self) -> &str {
        TOOL_READ_PLAN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_READ_PLAN.to_string(),
            description: Some(
                "Read the current plan with per-step statuses and whether every step \
                 is done. Check this before any final reply."
                    .to_string(),
            ),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(
        &self,
        _args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let Some(plan) = self.store.get(&ctx.session_id) else {
            return Ok(ToolCallContent {
                text: json!({"plan": null, "all_steps_completed": false}).to_string(),
            });
        };
        let report = json!({
            "plan": plan.snapshot(),
            "all_steps_completed": plan.all_steps_done(),
        });
        Ok(ToolCallContent {
            text: serde_json::to_string_pretty(&report)
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?,
        })
    }
}
