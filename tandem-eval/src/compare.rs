//! Paired statistical comparison of two prompt versions.
//!
//! Per rubric: paired differences `d_i = score_b_i − score_a_i` over the
//! shared query-id universe, mean difference, Bessel-corrected Cohen's d, and
//! a two-sided paired t-test p-value (binary-coerced floats and scaled
//! integers treated alike). A rubric is significant iff p < 0.05.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};
use tracing::warn;

use crate::error::EvalError;
use crate::judge::JudgeKind;
use crate::score::EvaluationResult;

/// Overall recommendation from the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "ADOPT")]
    Adopt,
    #[serde(rename = "REJECT")]
    Reject,
    #[serde(rename = "INCONCLUSIVE")]
    Inconclusive,
}

impl Recommendation {
    /// Exit code for the `compare` CLI command.
    pub fn exit_code(&self) -> i32 {
        match self {
            Recommendation::Adopt => 4,
            Recommendation::Reject => 5,
            Recommendation::Inconclusive => 6,
        }
    }
}

/// Per-rubric paired statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RubricComparison {
    pub mean_a: f64,
    pub mean_b: f64,
    pub mean_difference: f64,
    pub p_value: f64,
    pub cohens_d: f64,
    pub significant: bool,
}

/// The full comparison report persisted as
/// `statistical_comparison_<A>_<B>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub version_a: String,
    pub version_b: String,
    /// Query ids compared (intersection of both result sets).
    pub query_ids: Vec<u32>,
    /// Rubric name → paired statistics, in rubric order.
    pub rubrics: BTreeMap<String, RubricComparison>,
    pub improved_rubrics: usize,
    pub regressed_rubrics: usize,
    pub overall_recommendation: Recommendation,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Bessel-corrected sample standard deviation.
fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

/// Two-sided paired t-test p-value over the differences.
fn paired_p_value(diffs: &[f64]) -> f64 {
    let n = diffs.len();
    if n < 2 {
        return 1.0;
    }
    let sd = stddev(diffs);
    let m = mean(diffs);
    if sd == 0.0 {
        // All differences identical: either no effect at all, or a constant
        // shift the t-test cannot price — treat the latter as certain.
        return if m == 0.0 { 1.0 } else { 0.0 };
    }
    let t = m / (sd / (n as f64).sqrt());
    let df = (n - 1) as f64;
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => 1.0,
    }
}

fn rubric_comparison(a: &[f64], b: &[f64]) -> RubricComparison {
    let diffs: Vec<f64> = a.iter().zip(b.iter()).map(|(x, y)| y - x).collect();
    let mean_difference = mean(&diffs);
    let sd = stddev(&diffs);
    let cohens_d = if sd == 0.0 {
        0.0
    } else {
        mean_difference / sd
    };
    let p_value = paired_p_value(&diffs);
    RubricComparison {
        mean_a: mean(a),
        mean_b: mean(b),
        mean_difference,
        p_value,
        cohens_d,
        significant: p_value < 0.05,
    }
}

/// Compares two result sets pairwise by query id.
///
/// Queries present in only one side are skipped with a warning; the
/// comparison runs over the intersection and errors when it is empty.
pub fn compare(
    version_a: &str,
    results_a: &[EvaluationResult],
    version_b: &str,
    results_b: &[EvaluationResult],
) -> Result<ComparisonReport, EvalError> {
    let by_id_a: BTreeMap<u32, &EvaluationResult> =
        results_a.iter().map(|r| (r.query_id, r)).collect();
    let by_id_b: BTreeMap<u32, &EvaluationResult> =
        results_b.iter().map(|r| (r.query_id, r)).collect();

    let query_ids: Vec<u32> = by_id_a
        .keys()
        .filter(|id| by_id_b.contains_key(id))
        .copied()
        .collect();
    for id in by_id_a.keys().chain(by_id_b.keys()) {
        if !query_ids.contains(id) {
            warn!(query_id = id, "query present in only one side; skipped");
        }
    }
    if query_ids.is_empty() {
        return Err(EvalError::NoOverlap);
    }

    let mut rubrics = BTreeMap::new();
    let mut improved = 0usize;
    let mut regressed = 0usize;
    for kind in JudgeKind::ALL {
        let name = kind.name();
        let a: Vec<f64> = query_ids
            .iter()
            .filter_map(|id| by_id_a[id].rubric_score(name))
            .collect();
        let b: Vec<f64> = query_ids
            .iter()
            .filter_map(|id| by_id_b[id].rubric_score(name))
            .collect();
        let cmp = rubric_comparison(&a, &b);
        // Direction comes from the mean difference: a constant shift has
        // zero sample stddev and therefore an undefined Cohen's d.
        if cmp.significant && cmp.mean_difference > 0.0 {
            improved += 1;
        }
        if cmp.significant && cmp.mean_difference < 0.0 {
            regressed += 1;
        }
        rubrics.insert(name.to_string(), cmp);
    }

    let overall_recommendation = if regressed >= 1 {
        Recommendation::Reject
    } else if improved >= 1 {
        Recommendation::Adopt
    } else {
        Recommendation::Inconclusive
    };

    Ok(ComparisonReport {
        version_a: version_a.to_string(),
        version_b: version_b.to_string(),
        query_ids,
        rubrics,
        improved_rubrics: improved,
        regressed_rubrics: regressed,
        overall_recommendation,
    })
}
