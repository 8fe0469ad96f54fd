//! Research plan: ordered steps with a strict status state machine.
//!
//! Invariants enforced here, not by callers:
//! - step indices are contiguous from 0;
//! - at most one step is `in_progress` at any time;
//! - a step never returns to `pending` once it has been `in_progress`.
//!
//! Workers gate their terminal replies on [`Plan::all_steps_done`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from plan construction and step transitions.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no plan exists for this session")]
    NotFound,
    #[error("step index {0} out of range")]
    IndexOutOfRange(usize),
    #[error("step {index} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        index: usize,
        from: StepStatus,
        to: StepStatus,
    },
    #[error("step {0} cannot start while step {1} is in progress")]
    AnotherStepInProgress(usize, usize),
    #[error("plan requires at least one step")]
    Empty,
}

/// Status of one plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Skipped,
}

impl StepStatus {
    /// Terminal statuses never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }
}

/// One step of a research plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub index: usize,
    pub description: String,
    pub action_hint: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_text: Option<String>,
}

/// Ordered sequence of research steps.
///
/// Constructed via [`Plan::new`]; mutated only through the transition methods
/// so the invariants in the module docs hold at every point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// Creates a plan of pending steps from `(description, action_hint)` pairs.
    pub fn new(steps: Vec<(String, String)>) -> Result<Self, PlanError> {
        if steps.is_empty() {
            return Err(PlanError::Empty);
        }
        let steps = steps
            .into_iter()
            .enumerate()
            .map(|(index, (description, action_hint))| PlanStep {
                index,
                description,
                action_hint,
                status: StepStatus::Pending,
                result_text: None,
            })
            .collect();
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the step currently in progress, if any.
    pub fn in_progress(&self) -> Option<usize> {
        self.steps
            .iter()
            .find(|s| s.status == StepStatus::InProgress)
            .map(|s| s.index)
    }

    /// True when every step reached a terminal status.
    pub fn all_steps_done(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut PlanStep, PlanError> {
        let len = self.steps.len();
        self.steps
            .get_mut(index)
            .ok_or(PlanError::IndexOutOfRange(len.max(index)))
    }

    /// Moves a pending step to `in_progress`. Fails when another step is
    /// already in progress or the step already left `pending`.
    pub fn start_step(&mut self, index: usize) -> Result<(), PlanError> {
        if let Some(active) = self.in_progress() {
            if active != index {
                return Err(PlanError::AnotherStepInProgress(index, active));
            }
            return Ok(()); // starting the active step is a no-op
        }
        let step = self.step_mut(index)?;
        match step.status {
            StepStatus::Pending => {
                step.status = StepStatus::InProgress;
                Ok(())
            }
            from => Err(PlanError::InvalidTransition {
                index,
                from,
                to: StepStatus::InProgress,
            }),
        }
    }

    /// Completes a step (from `in_progress`, or directly from `pending` when
    /// no other step is active), recording its result text.
    pub fn complete_step(&mut self, index: usize, result_text: Option<String>) -> Result<(), PlanError> {
        if let Some(active) = self.in_progress() {
            if active != index {
                return Err(PlanError::AnotherStepInProgress(index, active));
            }
        }
        let step = self.step_mut(index)?;
        match step.status {
            StepStatus::Pending | StepStatus::InProgress => {
                step.status = StepStatus::Completed;
                step.result_text = result_text;
                Ok(())
            }
            from => Err(PlanError::InvalidTransition {
                index,
                from,
                to: StepStatus::Completed,
            }),
        }
    }

    /// Skips a step. Terminal steps cannot be skipped.
    pub fn skip_step(&mut self, index: usize, reason: Option<String>) -> Result<(), PlanError> {
        let step = self.step_mut(index)?;
        match step.status {
            StepStatus::Pending | StepStatus::InProgress => {
                step.status = StepStatus::Skipped;
                step.result_text = reason;
                Ok(())
            }
            from => Err(PlanError::InvalidTransition {
                index,
                from,
                to: StepStatus::Skipped,
            }),
        }
    }

    /// Rewrites the description/action hint of a non-terminal step.
    pub fn edit_step(
        &mut self,
        index: usize,
        description: Option<String>,
        action_hint: Option<String>,
    ) -> Result<(), PlanError> {
        let step = self.step_mut(index)?;
        if step.status.is_terminal() {
            return Err(PlanError::InvalidTransition {
                index,
                from: step.status,
                to: step.status,
            });
        }
        if let Some(d) = description {
            step.description = d;
        }
        if let Some(h) = action_hint {
            step.action_hint = h;
        }
        Ok(())
    }

    /// Appends a pending step at the end, keeping indices contiguous.
    pub fn append_step(&mut self, description: String, action_hint: String) {
        let index = self.steps.len();
        self.steps.push(PlanStep {
            index,
            description,
            action_hint,
            status: StepStatus::Pending,
            result_text: None,
        });
    }

    /// JSON snapshot for plan_update events and the snapshot endpoint.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Queries that trip any of these triggers must be planned; others may skip
/// planning at the supervisor's discretion.
pub fn planning_required(query: &str) -> bool {
    let q = query.to_lowercase();
    let multi_aspect = [" and ", "; ", " as well as ", "aspects"]
        .iter()
        .any(|m| q.contains(m));
    let time_constraint = ["since", "between", "last year", "past ", "recent", "20"]
        .iter()
        .any(|m| q.contains(m));
    let comparison = ["compare", " vs ", "versus", "difference between"]
        .iter()
        .any(|m| q.contains(m));
    let comprehensive = ["comprehensive", "in depth", "detailed report", "everything about"]
        .iter()
        .any(|m| q.contains(m));
    let conflict_expected = ["controversy", "debate", "conflicting", "disputed"]
        .iter()
        .any(|m| q.contains(m));
    multi_aspect || time_constraint || comparison || comprehensive || conflict_expected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan3() -> Plan {
        Plan::new(vec![
            ("find sources".into(), "search".into()),
            ("extract quotes".into(), "read".into()),
            ("verify".into(), "verify".into()),
        ])
        .unwrap()
    }

    /// **Scenario**: indices are contiguous from 0 after construction and append.
    #[test]
    fn indices_contiguous() {
        let mut plan = plan3();
        plan.append_step("write up".into(), "write".into());
        let indices: Vec<usize> = plan.steps().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
    }

    /// **Scenario**: empty plans are rejected.
    #[test]
    fn empty_plan_rejected() {
        assert!(matches!(Plan::new(vec![]), Err(PlanError::Empty)));
    }

    /// **Scenario**: at most one step is in_progress at a time, ever.
    #[test]
    fn single_in_progress_enforced() {
        let mut plan = plan3();
        plan.start_step(0).unwrap();
        let err = plan.start_step(1).unwrap_err();
        assert!(matches!(err, PlanError::AnotherStepInProgress(1, 0)));
        plan.complete_step(0, Some("done".into())).unwrap();
        plan.start_step(1).unwrap();
        assert_eq!(plan.in_progress(), Some(1));
    }

    /// **Scenario**: a step never moves back to pending after being in_progress.
    #[test]
    fn no_regression_to_pending() {
        let mut plan = plan3();
        plan.start_step(0).unwrap();
        plan.complete_step(0, None).unwrap();
        let err = plan.start_step(0).unwrap_err();
        assert!(matches!(
            err,
            PlanError::InvalidTransition {
                from: StepStatus::Completed,
                ..
            }
        ));
    }

    /// **Scenario**: all_steps_done counts skipped as terminal.
    #[test]
    fn all_steps_done_with_skips() {
        let mut plan = plan3();
        plan.complete_step(0, None).unwrap();
        plan.complete_step(1, None).unwrap();
        assert!(!plan.all_steps_done());
        plan.skip_step(2, Some("not needed".into())).unwrap();
        assert!(plan.all_steps_done());
    }

    /// **Scenario**: out-of-range indices surface IndexOutOfRange.
    #[test]
    fn out_of_range_index() {
        let mut plan = plan3();
        assert!(matches!(
            plan.start_step(9),
            Err(PlanError::IndexOutOfRange(_))
        ));
    }

    /// **Scenario**: editing a terminal step is rejected; editing pending works.
    #[test]
    fn edit_step_rules() {
        let mut plan = plan3();
        plan.edit_step(1, Some("extract exact quotes".into()), None)
            .unwrap();
        assert_eq!(plan.steps()[1].description, "extract exact quotes");
        plan.complete_step(0, None).unwrap();
        assert!(plan.edit_step(0, Some("x".into()), None).is_err());
    }

    /// **Scenario**: planning triggers per query class.
    #[test]
    fn planning_trigger_classes() {
        assert!(planning_required("Compare React vs Vue for large apps"));
        assert!(planning_required(
            "What changed in quantum computing since 2023?"
        ));
        assert!(planning_required(
            "Give a comprehensive overview of CRISPR therapies"
        ));
        assert!(planning_required(
            "Summarize the debate around nuclear power safety"
        ));
        assert!(!planning_required("When did GPT-4 release?"));
    }
}
