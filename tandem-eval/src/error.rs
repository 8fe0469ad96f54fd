//! Evaluation pipeline errors.

use thiserror::Error;

/// Errors from the evaluation pipeline.
///
/// Aggregation errors cause a single `(version, query_id)` to be skipped and
/// logged, never partially recorded; comparison errors abort the comparison.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("missing judge output: {0}")]
    MissingJudge(&'static str),
    #[error("judge {judge} returned invalid score {value} (expected {expected})")]
    InvalidScore {
        judge: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("judge {0} returned empty reasoning")]
    EmptyReasoning(&'static str),
    #[error("judge output is not the expected JSON object: {0}")]
    MalformedJudgeOutput(String),
    #[error("orchestrator run failed: {0}")]
    Run(String),
    #[error("unknown query id: {0}")]
    UnknownQuery(u32),
    #[error("unknown prompt version: {0}")]
    UnknownVersion(String),
    #[error("comparison requires overlapping query ids, found none")]
    NoOverlap,
}
