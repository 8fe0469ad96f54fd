//! Create-plan tool: install the session's research plan.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use stream_event::{PlanUpdateAction, ProtocolEvent};

use crate::plan::Plan;
use crate::tools::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::PlanStore;

/// Tool name for creating a research plan.
pub const TOOL_CREATE_PLAN: &str = "create_research_plan";

pub struct CreatePlanTool {
    store: Arc<PlanStore>,
}

impl CreatePlanTool {
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self { store }
    }
}

fn parse_steps(args: &serde_json::Value) -> Result<Vec<(String, String)>, ToolSourceError> {
    let arr = args
        .get("steps")
        .and_then(|v| v.as_array())
        .ok_or_else(|| ToolSourceError::InvalidInput("missing or invalid 'steps' array".into()))?;
    let mut out = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        let obj = v
            .as_object()
            .ok_or_else(|| ToolSourceError::InvalidInput(format!("steps[{i}] must be an object")))?;
        let description = obj
            .get("description")
            .and_then(|x| x.as_str())
            .map(String::from)
            .ok_or_else(|| {
                ToolSourceError::InvalidInput(format!("steps[{i}] missing 'description'"))
            })?;
        let action_hint = obj
            .get("action_hint")
            .and_then(|x| x.as_str())
            .unwrap_or("search")
            .to_string();
        out.push((description, action_hint));
    }
    Ok(out)
}

#[async_trait]
impl Tool for CreatePlanTool {
    fn name(&self) -> &str {
        TOOL_CREATE_PLAN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_CREATE_PLAN.to_string(),
            description: Some(
                "Create the research plan for this session. Replaces any previous plan."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "description": { "type": "string" },
                                "action_hint": { "type": "string" }
                            },
                            "required": ["description"]
                        }
                    }
                },
                "required": ["steps"]
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let steps = parse_steps(&args)?;
        let plan = Plan::new(steps).map_err(ToolSourceError::from)?;
        let snapshot = plan.snapshot();
        let replaced = self.store.install(&ctx.session_id, plan);

        ctx.stream
            .emit(ProtocolEvent::PlanUpdate {
                action: if replaced {
                    PlanUpdateAction::Replaced
                } else {
                    PlanUpdateAction::Created
                },
                plan: snapshot.clone(),
            })
            .await;

        Ok(ToolCallContent {
            text: serde_json::to_string_pretty(&snapshot)
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?,
        })
    }
}
