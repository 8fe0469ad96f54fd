//! Result aggregation: the only construction site for [`EvaluationResult`].
//!
//! Validation is strict: all seven judge names present, binary scores coerce
//! to exactly 0.0 or 1.0, scaled scores to an integer in 1..=5, reasoning
//! non-empty. Any violation raises and the `(version, query_id)` is skipped
//! by the harness, never partially recorded.

use std::collections::HashMap;

use crate::error::EvalError;
use crate::judge::{JudgeDecision, JudgeKind};
use crate::score::{BinaryScore, EvaluationResult, ScaledScore};

fn coerce_binary(kind: JudgeKind, decision: &JudgeDecision) -> Result<BinaryScore, EvalError> {
    let value = decision.score.as_f64().ok_or_else(|| EvalError::InvalidScore {
        judge: kind.name(),
        value: decision.score.to_string(),
        expected: "0 or 1",
    })?;
    if value != 0.0 && value != 1.0 {
        return Err(EvalError::InvalidScore {
            judge: kind.name(),
            value: decision.score.to_string(),
            expected: "0 or 1",
        });
    }
    if decision.reasoning.trim().is_empty() {
        return Err(EvalError::EmptyReasoning(kind.name()));
    }
    Ok(BinaryScore {
        score: value,
        reasoning: decision.reasoning.clone(),
    })
}

fn coerce_scaled(kind: JudgeKind, decision: &JudgeDecision) -> Result<ScaledScore, EvalError> {
    let value = decision.score.as_f64().ok_or_else(|| EvalError::InvalidScore {
        judge: kind.name(),
        value: decision.score.to_string(),
        expected: "integer 1-5",
    })?;
    if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
        return Err(EvalError::InvalidScore {
            judge: kind.name(),
            value: decision.score.to_string(),
            expected: "integer 1-5",
        });
    }
    if decision.reasoning.trim().is_empty() {
        return Err(EvalError::EmptyReasoning(kind.name()));
    }
    Ok(ScaledScore {
        score: value as u8,
        reasoning: decision.reasoning.clone(),
    })
}

fn decision<'a>(
    decisions: &'a HashMap<String, JudgeDecision>,
    kind: JudgeKind,
) -> Result<&'a JudgeDecision, EvalError> {
    decisions
        .get(kind.name())
        .ok_or(EvalError::MissingJudge(kind.name()))
}

/// Binds raw judge decisions into a fully-typed [`EvaluationResult`].
pub fn aggregate(
    query_id: u32,
    query_text: &str,
    prompt_version: &str,
    decisions: &HashMap<String, JudgeDecision>,
) -> Result<EvaluationResult, EvalError> {
    // Presence first, so a missing judge is reported as missing even when
    // another judge also has a bad score.
    for kind in JudgeKind::ALL {
        decision(decisions, kind)?;
    }

    Ok(EvaluationResult::new(
        query_id,
        query_text.to_string(),
        prompt_version.to_string(),
        coerce_binary(JudgeKind::PlanningQuality, decision(decisions, JudgeKind::PlanningQuality)?)?,
        coerce_scaled(
            JudgeKind::ExecutionCompleteness,
            decision(decisions, JudgeKind::ExecutionCompleteness)?,
        )?,
        coerce_scaled(JudgeKind::SourceQuality, decision(decisions, JudgeKind::SourceQuality)?)?,
        coerce_binary(
            JudgeKind::CitationAccuracy,
            decision(decisions, JudgeKind::CitationAccuracy)?,
        )?,
        coerce_scaled(
            JudgeKind::AnswerCompleteness,
            decision(decisions, JudgeKind::AnswerCompleteness)?,
        )?,
        coerce_binary(JudgeKind::FactualAccuracy, decision(decisions, JudgeKind::FactualAccuracy)?)?,
        coerce_binary(JudgeKind::AutonomyScore, decision(decisions, JudgeKind::AutonomyScore)?)?,
    ))
}
