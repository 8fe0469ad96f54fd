//! # tandem-eval
//!
//! Deterministic evaluation pipeline for Tandem prompt versions.
//!
//! A fixed query set runs through one prompt version with per-query disk
//! caching, seven independent judges score each response, a strict aggregator
//! binds the scores into typed [`EvaluationResult`]s, and a paired
//! statistical comparison of two versions yields ADOPT / REJECT /
//! INCONCLUSIVE.
//!
//! Modules: [`queries`] (the fixed set), [`harness`] (fan-out + caching),
//! [`judge`] (the seven rubric judges), [`aggregate`] (sole construction site
//! for results), [`compare`] (paired t-test and decision rule),
//! [`artifacts`] (on-disk layout).

pub mod aggregate;
pub mod artifacts;
pub mod compare;
pub mod error;
pub mod harness;
pub mod judge;
pub mod queries;
pub mod score;

pub use aggregate::aggregate;
pub use artifacts::{ResearcherResponse, ResultsDir};
pub use compare::{compare, ComparisonReport, Recommendation, RubricComparison};
pub use error::EvalError;
pub use harness::{run_eval, EvalOptions, EvalSummary, OrchestratorRunner, ResponseRunner};
pub use judge::{run_all_judges, run_judge, JudgeDecision, JudgeKind};
pub use queries::{query_set, EvalQuery, QueryCategory};
pub use score::{BinaryScore, EvaluationResult, ScaledScore, RUNNER_VERSION};
