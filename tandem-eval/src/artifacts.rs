//! On-disk evaluation artifacts.
//!
//! Layout under the results directory:
//!
//! ```text
//! response_<version>_q<id>.json        # ResearcherResponse, per query
//! evaluation_<version>_q<id>.json      # Raw judge decisions, per query
//! aggregated_<version>.json            # Per-rubric means across all queries
//! evaluation_results_<version>.json    # Vec<EvaluationResult> (typed, canonical)
//! statistical_comparison_<A>_<B>.json  # ComparisonReport
//! ```
//!
//! Artifacts are written once and read back on re-runs; deleting one
//! response file re-runs exactly that query.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::judge::JudgeDecision;
use crate::score::EvaluationResult;

/// The orchestrator's answer to one evaluation query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearcherResponse {
    pub query_id: u32,
    pub prompt_version: String,
    pub response_text: String,
    /// Plan snapshot at the end of the run, if the researcher planned.
    #[serde(default)]
    pub plan_snapshot: serde_json::Value,
    /// Names of tools invoked during the run, in call order.
    #[serde(default)]
    pub tool_call_log: Vec<String>,
}

/// Typed access to the evaluation artifact directory.
#[derive(Debug, Clone)]
pub struct ResultsDir {
    root: PathBuf,
}

impl ResultsDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_root(&self) -> Result<(), EvalError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root)?;
        }
        Ok(())
    }

    pub fn response_path(&self, version: &str, query_id: u32) -> PathBuf {
        self.root.join(format!("response_{version}_q{query_id}.json"))
    }

    pub fn evaluation_path(&self, version: &str, query_id: u32) -> PathBuf {
        self.root
            .join(format!("evaluation_{version}_q{query_id}.json"))
    }

    pub fn aggregated_path(&self, version: &str) -> PathBuf {
        self.root.join(format!("aggregated_{version}.json"))
    }

    pub fn results_path(&self, version: &str) -> PathBuf {
        self.root
            .join(format!("evaluation_results_{version}.json"))
    }

    pub fn comparison_path(&self, version_a: &str, version_b: &str) -> PathBuf {
        self.root
            .join(format!("statistical_comparison_{version_a}_{version_b}.json"))
    }

    fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), EvalError> {
        self.ensure_root()?;
        let body = serde_json::to_string_pretty(value)?;
        std::fs::write(path, body)?;
        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<Option<T>, EvalError> {
        if !path.exists() {
            return Ok(None);
        }
        let body = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&body)?))
    }

    pub fn write_response(&self, response: &ResearcherResponse) -> Result<(), EvalError> {
        self.write_json(
            &self.response_path(&response.prompt_version, response.query_id),
            response,
        )
    }

    pub fn read_response(
        &self,
        version: &str,
        query_id: u32,
    ) -> Result<Option<ResearcherResponse>, EvalError> {
        self.read_json(&self.response_path(version, query_id))
    }

    pub fn write_evaluation(
        &self,
        version: &str,
        query_id: u32,
        decisions: &HashMap<String, JudgeDecision>,
    ) -> Result<(), EvalError> {
        self.write_json(&self.evaluation_path(version, query_id), decisions)
    }

    pub fn read_evaluation(
        &self,
        version: &str,
        query_id: u32,
    ) -> Result<Option<HashMap<String, JudgeDecision>>, EvalError> {
        self.read_json(&self.evaluation_path(version, query_id))
    }

    pub fn write_results(
        &self,
        version: &str,
        results: &[EvaluationResult],
    ) -> Result<(), EvalError> {
        self.write_json(&self.results_path(version), &results)
    }

    pub fn read_results(&self, version: &str) -> Result<Option<Vec<EvaluationResult>>, EvalError> {
        self.read_json(&self.results_path(version))
    }

    pub fn write_aggregated(
        &self,
        version: &str,
        summary: &serde_json::Value,
    ) -> Result<(), EvalError> {
        self.write_json(&self.aggregated_path(version), summary)
    }

    pub fn write_comparison(
        &self,
        version_a: &str,
        version_b: &str,
        report: &crate::compare::ComparisonReport,
    ) -> Result<(), EvalError> {
        self.write_json(&self.comparison_path(version_a, version_b), report)
    }
}
