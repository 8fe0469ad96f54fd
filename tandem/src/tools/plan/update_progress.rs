//! Update-plan-progress tool: step status transitions.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use stream_event::{PlanUpdateAction, ProtocolEvent};

use crate::tools::{
    required_index, required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec,
};

use super::PlanStore;

/// Tool name for updating plan progress.
pub const TOOL_UPDATE_PLAN_PROGRESS: &str = "update_plan_progress";

pub struct UpdatePlanProgressTool {
    store: Arc<PlanStore>,
}

impl UpdatePlanProgressTool {
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdatePlanProgressTool {
    fn name(&self) -> &str {
        TOOL_UPDATE_PLAN_PROGRESS
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_UPDATE_PLAN_PROGRESS.to_string(),
            description: Some(
                "Move a plan step to in_progress, completed, or skipped. Call after \
                 executing every step."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "index": { "type": "integer", "minimum": 0 },
                    "status": { "type": "string", "enum": ["in_progress", "completed", "skipped"] },
                    "result_text": { "type": "string" }
                },
                "required": ["index", "status"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let index = required_index(&args, "index")?;
        let status = required_str(&args, "status")?;
        let result_text = args
            .get("result_text")
            .and_then(|v| v.as_str())
            .map(String::from);

        let action = match status {
            "in_progress" => {
                self.store.update(&ctx.session_id, |p| p.start_step(index))?;
                PlanUpdateAction::StepStarted
            }
            "completed" => {
                self.store
                    .update(&ctx.session_id, |p| p.complete_step(index, result_text))?;
                PlanUpdateAction::StepCompleted
            }
            "skipped" => {
                self.store
                    .update(&ctx.session_id, |p| p.skip_step(index, result_text))?;
                PlanUpdateAction::StepSkipped
            }
            other => {
                return Err(ToolSourceError::InvalidInput(format!(
                    "unknown status '{other}' (use in_progress, completed, or skipped)"
                )))
            }
        };

        let snapshot = self
            .store
            .get(&ctx.session_id)
            .map(|p| p.snapshot())
            .unwrap_or(serde_json::Value::Null);
        ctx.stream
            .emit(ProtocolEvent::PlanUpdate {
                action,
                plan: snapshot.clone(),
            })
            .await;

        Ok(ToolCallContent {
            text: serde_json::to_string_pretty(&snapshot)
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?,
        })
    }
}
