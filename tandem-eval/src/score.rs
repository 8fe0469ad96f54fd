//! Typed rubric scores and the evaluation result record.
//!
//! [`EvaluationResult`] is constructed only by the aggregator
//! ([`crate::aggregate`]); the struct is `#[non_exhaustive]` so no other
//! crate can assemble one from loose values. Persisted results deserialize
//! through serde and reject unknown fields.

use serde::{Deserialize, Serialize};

/// Version stamp written into every result this runner produces.
pub const RUNNER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A pass/fail rubric score: exactly 0.0 or 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinaryScore {
    pub score: f64,
    pub reasoning: String,
}

/// A 1–5 rubric score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaledScore {
    pub score: u8,
    pub reasoning: String,
}

/// Fully-typed aggregation of all seven judge scores for one
/// `(query, prompt version)`.
///
/// Exactly these seven rubric fields; nothing else is permitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct EvaluationResult {
    pub query_id: u32,
    pub query_text: String,
    pub prompt_version: String,
    pub planning_quality: BinaryScore,
    pub execution_completeness: ScaledScore,
    pub source_quality: ScaledScore,
    pub citation_accuracy: BinaryScore,
    pub answer_completeness: ScaledScore,
    pub factual_accuracy: BinaryScore,
    pub autonomy_score: BinaryScore,
    pub timestamp: String,
    pub runner_version: String,
}

impl EvaluationResult {
    /// Crate-internal constructor; the aggregator is the only caller.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        query_id: u32,
        query_text: String,
        prompt_version: String,
        planning_quality: BinaryScore,
        execution_completeness: ScaledScore,
        source_quality: ScaledScore,
        citation_accuracy: BinaryScore,
        answer_completeness: ScaledScore,
        factual_accuracy: BinaryScore,
        autonomy_score: BinaryScore,
    ) -> Self {
        Self {
            query_id,
            query_text,
            prompt_version,
            planning_quality,
            execution_completeness,
            source_quality,
            citation_accuracy,
            answer_completeness,
            factual_accuracy,
            autonomy_score,
            timestamp: chrono::Utc::now().to_rfc3339(),
            runner_version: RUNNER_VERSION.to_string(),
        }
    }

    /// Numeric score of a rubric by name (binary as 0/1, scaled as 1–5).
    /// Used by the comparator and the aggregated summary.
    pub fn rubric_score(&self, rubric: &str) -> Option<f64> {
        match rubric {
            "planning_quality" => Some(self.planning_quality.score),
            "execution_completeness" => Some(self.execution_completeness.score as f64),
            "source_quality" => Some(self.source_quality.score as f64),
            "citation_accuracy" => Some(self.citation_accuracy.score),
            "answer_completeness" => Some(self.answer_completeness.score as f64),
            "factual_accuracy" => Some(self.factual_accuracy.score),
            "autonomy_score" => Some(self.autonomy_score.score),
            _ => None,
        }
    }
}
