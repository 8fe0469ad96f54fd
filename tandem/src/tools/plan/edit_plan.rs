//! Edit-plan tool: rewrite a pending step or append new steps.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use stream_event::{PlanUpdateAction, ProtocolEvent};

use crate::tools::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::PlanStore;

/// Tool name for editing the plan.
pub const TOOL_EDIT_PLAN: &str = "edit_plan";

pub struct EditPlanTool {
    store: Arc<PlanStore>,
}

impl EditPlanTool {
    pub fn new(store: Arc<PlanStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for EditPlanTool {
    fn name(&self) -> &str {
        TOOL_EDIT_PLAN
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_EDIT_PLAN.to_string(),
            description: Some(
                "Rewrite a not-yet-finished step (index + description/action_hint) or \
                 append a new step (append_description)."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "index": { "type": "integer", "minimum": 0 },
                    "description": { "type": "string" },
                    "action_hint": { "type": "string" },
                    "append_description": { "type": "string" },
                    "append_action_hint": { "type": "string" }
                }
            }),
        }
    }

    async fn call(
        &self,
        args: serde_json::Value,
        ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let edited_existing = if let Some(index) = args.get("index").and_then(|v| v.as_u64()) {
            let description = args
                .get("description")
                .and_then(|v| v.as_str())
                .map(String::from);
            let action_hint = args
                .get("action_hint")
                .and_then(|v| v.as_str())
                .map(String::from);
            if description.is_none() && action_hint.is_none() {
                return Err(ToolSourceError::InvalidInput(
                    "edit needs 'description' or 'action_hint'".to_string(),
                ));
            }
            self.store.update(&ctx.session_id, |p| {
                p.edit_step(index as usize, description, action_hint)
            })?;
            true
        } else {
            false
        };

        let appended = if let Some(desc) = args.get("append_description").and_then(|v| v.as_str()) {
            let hint = args
                .get("append_action_hint")
                .and_then(|v| v.as_str())
                .unwrap_or("search")
                .to_string();
            self.store.update(&ctx.session_id, |p| {
                p.append_step(desc.to_string(), hint);
                Ok(())
            })?;
            true
        } else {
            false
        };

        if !edited_existing && !appended {
            return Err(ToolSourceError::InvalidInput(
                "nothing to do: provide 'index' or 'append_description'".to_string(),
            ));
        }

        let snapshot = self
            .store
            .get(&ctx.session_id)
            .map(|p| p.snapshot())
            .unwrap_or(serde_json::Value::Null);
        ctx.stream
            .emit(ProtocolEvent::PlanUpdate {
                action: PlanUpdateAction::Edited,
                plan: snapshot.clone(),
            })
            .await;

        Ok(ToolCallContent {
            text: serde_json::to_string_pretty(&snapshot)
                .map_err(|e| ToolSourceError::Transport(e.to_string()))?,
        })
    }
}
