//! Comparison decision scenarios over persisted artifacts.
//!
//! Results enter through serde (the typed artifact on disk), the same way
//! `compare` consumes them in production; nothing outside the aggregator can
//! construct an `EvaluationResult` directly.

use tandem_eval::{compare, EvaluationResult, Recommendation, ResultsDir};

fn result_json(query_id: u32, version: &str, binary: f64, scaled: u8) -> serde_json::Value {
    let b = |score: f64| serde_json::json!({"score": score, "reasoning": "r"});
    let s = |score: u8| serde_json::json!({"score": score, "reasoning": "r"});
    serde_json::json!({
        "query_id": query_id,
        "query_text": format!("query {query_id}"),
        "prompt_version": version,
        "planning_quality": b(binary),
        "execution_completeness": s(scaled),
        "source_quality": s(scaled),
        "citation_accuracy": b(binary),
        "answer_completeness": s(scaled),
        "factual_accuracy": b(binary),
        "autonomy_score": b(binary),
        "timestamp": "2026-08-01T00:00:00Z",
        "runner_version": "0.1.0",
    })
}

fn results(version: &str, make: impl Fn(u32) -> serde_json::Value) -> Vec<EvaluationResult> {
    (1..=8)
        .map(|id| serde_json::from_value(make(id)).unwrap())
        .collect()
}

/// **Scenario**: challenger strictly at or above benchmark everywhere,
/// strictly better with varying margins on several rubrics: ADOPT, exit 4,
/// and the persisted report round-trips.
#[test]
fn strict_improvement_adopts() {
    let a = results("benchmark", |id| result_json(id, "benchmark", 0.0, 2));
    let b = results("challenger_1", |id| {
        result_json(id, "challenger_1", 1.0, if id % 2 == 0 { 5 } else { 4 })
    });
    let report = compare("benchmark", &a, "challenger_1", &b).unwrap();
    assert!(report.improved_rubrics >= 3);
    assert_eq!(report.regressed_rubrics, 0);
    assert_eq!(report.overall_recommendation, Recommendation::Adopt);
    assert_eq!(report.overall_recommendation.exit_code(), 4);

    let dir = tempfile::tempdir().unwrap();
    let results_dir = ResultsDir::new(dir.path());
    results_dir
        .write_comparison("benchmark", "challenger_1", &report)
        .unwrap();
    let raw = std::fs::read_to_string(
        dir.path()
            .join("statistical_comparison_benchmark_challenger_1.json"),
    )
    .unwrap();
    let back: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(back["overall_recommendation"], "ADOPT");
    assert_eq!(back["rubrics"]["planning_quality"]["mean_difference"], 1.0);
}

/// **Scenario**: identical result sets compare INCONCLUSIVE with all-zero
/// mean differences, exit 6.
#[test]
fn identical_sets_inconclusive() {
    let a = results("benchmark", |id| {
        result_json(id, "benchmark", (id % 2) as f64, 3)
    });
    let report = compare("benchmark", &a, "benchmark", &a).unwrap();
    assert_eq!(report.overall_recommendation, Recommendation::Inconclusive);
    assert_eq!(report.overall_recommendation.exit_code(), 6);
    for cmp in report.rubrics.values() {
        assert_eq!(cmp.mean_difference, 0.0);
        assert!(!cmp.significant);
    }
}

/// **Scenario**: one significantly regressed rubric rejects even when other
/// rubrics improved, exit 5.
#[test]
fn any_regression_rejects() {
    let a = results("benchmark", |id| result_json(id, "benchmark", 0.0, 4));
    let b = results("challenger_1", |id| {
        // Binary rubrics improve; scaled rubrics fall.
        result_json(id, "challenger_1", 1.0, if id % 2 == 0 { 2 } else { 3 })
    });
    let report = compare("benchmark", &a, "challenger_1", &b).unwrap();
    assert!(report.improved_rubrics >= 1);
    assert!(report.regressed_rubrics >= 1);
    assert_eq!(report.overall_recommendation, Recommendation::Reject);
    assert_eq!(report.overall_recommendation.exit_code(), 5);
}

/// **Scenario**: the typed artifact written by one run feeds compare through
/// the results directory (read side of the canonical file).
#[test]
fn read_results_feeds_compare() {
    let dir = tempfile::tempdir().unwrap();
    let results_dir = ResultsDir::new(dir.path());

    let a = results("benchmark", |id| result_json(id, "benchmark", 1.0, 3));
    let body = serde_json::to_string_pretty(&a).unwrap();
    std::fs::write(dir.path().join("evaluation_results_benchmark.json"), body).unwrap();

    let loaded = results_dir.read_results("benchmark").unwrap().unwrap();
    assert_eq!(loaded.len(), 8);
    let report = compare("benchmark", &loaded, "benchmark", &loaded).unwrap();
    assert_eq!(report.overall_recommendation, Recommendation::Inconclusive);
}
