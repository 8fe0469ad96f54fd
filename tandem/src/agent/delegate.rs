//! Delegation tool stubs bound to the supervisor.
//!
//! `delegate_to_*` calls are routed by the orchestrator, not executed: the
//! supervisor node parses the contract and the router selects the worker
//! node. These stubs exist so the LLM sees the delegation tools with their
//! contract schema, and so a stray direct execution is a structured error
//! instead of silence.

use async_trait::async_trait;
use serde_json::json;

use crate::tools::{Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

use super::role::WorkerRole;
use super::state::Delegation;

/// The delegation tool for one worker role.
pub struct DelegateTool {
    role: WorkerRole,
}

impl DelegateTool {
    pub fn new(role: WorkerRole) -> Self {
        Self { role }
    }

    fn describe(role: WorkerRole) -> &'static str {
        match role {
            WorkerRole::Researcher => {
                "Delegate web research to the researcher. It plans, searches, and returns a citation-verified report."
            }
            WorkerRole::DataScientist => {
                "Delegate statistical analysis of gathered data to the data scientist."
            }
            WorkerRole::ExpertAnalyst => {
                "Delegate deep interpretation of findings to the expert analyst."
            }
            WorkerRole::Writer => {
                "Delegate document production to the writer (file writes are approval-gated)."
            }
            WorkerRole::Reviewer => {
                "Delegate read-only critique of an artifact to the reviewer."
            }
        }
    }
}

#[async_trait]
impl Tool for DelegateTool {
    fn name(&self) -> &str {
        self.role.delegation_tool()
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.role.delegation_tool().to_string(),
            description: Some(Self::describe(self.role).to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task": { "type": "string", "description": "What the worker must do" },
                    "input_paths": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Absolute paths of input artifacts"
                    },
                    "expected_outputs": { "type": "string", "description": "What the worker must produce" },
                    "success_criteria": { "type": "string", "description": "How to judge the worker done" }
                },
                "required": ["task", "expected_outputs", "success_criteria"]
            }),
        }
    }

    async fn call(
        &self,
        _args: serde_json::Value,
        _ctx: &ToolCallContext,
    ) -> Result<ToolCallContent, ToolSourceError> {
        Err(ToolSourceError::InvalidInput(
            "delegation calls are routed by the orchestrator".to_string(),
        ))
    }
}

/// Parses and lints a delegation contract from tool-call arguments.
///
/// Missing fields and relative input paths are warnings, not failures: the
/// delegation proceeds and the warnings surface on the stream as part of the
/// worker transition reason.
pub fn parse_delegation(
    invocation_id: &str,
    worker: WorkerRole,
    args: &serde_json::Value,
) -> Delegation {
    let mut warnings = Vec::new();
    let task = args
        .get("task")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if task.is_empty() {
        warnings.push("delegation missing task".to_string());
    }
    let input_paths: Vec<String> = args
        .get("input_paths")
        .and_then(|v| v.as_array())
        .map(|a| {
            a.iter()
                .filter_map(|p| p.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default();
    for p in &input_paths {
        if !p.starts_with('/') {
            warnings.push(format!("relative input path in delegation: {p}"));
        }
    }
    let expected_outputs = args
        .get("expected_outputs")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if expected_outputs.is_empty() {
        warnings.push("delegation missing expected_outputs".to_string());
    }
    let success_criteria = args
        .get("success_criteria")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    if success_criteria.is_empty() {
        warnings.push("delegation missing success_criteria".to_string());
    }

    Delegation {
        invocation_id: invocation_id.to_string(),
        worker,
        task,
        input_paths,
        expected_outputs,
        success_criteria,
        warnings,
    }
}

/// Startup lint: every delegation tool spec must require the full contract.
pub fn lint_delegation_spec(spec: &ToolSpec) -> Result<(), String> {
    let required: Vec<&str> = spec
        .input_schema
        .get("required")
        .and_then(|r| r.as_array())
        .map(|a| a.iter().filter_map(|v| v.as_str()).collect())
        .unwrap_or_default();
    for field in ["task", "expected_outputs", "success_criteria"] {
        if !required.contains(&field) {
            return Err(format!(
                "delegation tool {} does not require '{}'",
                spec.name, field
            ));
        }
    }
    Ok(())
}
