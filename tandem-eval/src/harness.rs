//! Evaluation harness: run the query set through one prompt version.
//!
//! Per query: check the disk cache keyed by `(prompt_version, query_id)`,
//! otherwise instantiate a fresh orchestrator with the version pinned, run to
//! completion, fan out the seven judges, aggregate, persist. The harness is
//! idempotent: deleting one cached artifact re-runs exactly that query, and
//! `no_cache` forces re-execution of everything.
//!
//! Fan-out parallelism is bounded by a semaphore; the final aggregate is
//! ordered by query id regardless of completion order.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Semaphore};
use tracing::{info, warn};

use tandem::agent::{build_orchestrator, OrchestratorDeps};
use tandem::approval::ApprovalHub;
use tandem::cache::InMemoryCitationCache;
use tandem::graph::RunContext;
use tandem::llm::LlmClient;
use tandem::memory::RunConfig;
use tandem::prompts::{known_versions, PromptVersion};
use tandem::stream::StreamWriter;
use tandem::tools::{PlanStore, SearchProvider};

use crate::aggregate::aggregate;
use crate::artifacts::{ResearcherResponse, ResultsDir};
use crate::error::EvalError;
use crate::judge::{run_all_judges, JudgeKind};
use crate::queries::{queries_by_ids, query_set, EvalQuery};
use crate::score::EvaluationResult;

/// Runs one evaluation query to a response. Implemented by the real
/// orchestrator runner and by test fakes.
#[async_trait]
pub trait ResponseRunner: Send + Sync {
    async fn run_query(
        &self,
        version: &PromptVersion,
        query: &EvalQuery,
    ) -> Result<ResearcherResponse, EvalError>;
}

/// Production runner: a fresh orchestrator per query with the prompt version
/// pinned, an isolated in-memory cache, and a collector for the tool-call log.
pub struct OrchestratorRunner {
    pub llm_supervisor: Arc<dyn LlmClient>,
    pub llm_worker: Arc<dyn LlmClient>,
    pub search: Arc<dyn SearchProvider>,
    pub workspace_root: PathBuf,
    pub max_worker_turns: u32,
}

#[async_trait]
impl ResponseRunner for OrchestratorRunner {
    async fn run_query(
        &self,
        version: &PromptVersion,
        query: &EvalQuery,
    ) -> Result<ResearcherResponse, EvalError> {
        let plans = Arc::new(PlanStore::new());
        let deps = OrchestratorDeps {
            llm_supervisor: self.llm_supervisor.clone(),
            llm_worker: self.llm_worker.clone(),
            search: self.search.clone(),
            cache: Arc::new(InMemoryCitationCache::new()),
            plans: plans.clone(),
            approvals: Arc::new(ApprovalHub::new(60)),
            checkpointer: None,
            workspace_root: self.workspace_root.clone(),
            prompt_version: version.clone(),
            auto_approve_max_bytes: 64 * 1024,
            max_worker_turns: self.max_worker_turns,
            extra_supervisor_tools: vec![],
        };
        let orchestrator = build_orchestrator(deps).map_err(|e| EvalError::Run(e.to_string()))?;

        let session_id = format!("eval_{}_q{}", version, query.id);
        let (tx, mut rx) = mpsc::channel(1024);
        let collector = tokio::spawn(async move {
            let mut log = Vec::new();
            while let Some(ev) = rx.recv().await {
                if let Ok(v) = stream_event::ProtocolEvent::to_value(&ev) {
                    if v["type"] == "tool_call" {
                        if let Some(name) = v["name"].as_str() {
                            log.push(name.to_string());
                        }
                    }
                }
            }
            log
        });

        let config = RunConfig::for_session(&session_id).with_auto_approve(true);
        let ctx = RunContext::new(config).with_stream(StreamWriter::new(tx));
        let state = orchestrator
            .run(query.text, &ctx)
            .await
            .map_err(|e| EvalError::Run(e.to_string()))?;
        drop(ctx);
        let tool_call_log = collector.await.unwrap_or_default();

        let response_text = state
            .final_response
            .ok_or_else(|| EvalError::Run("orchestrator produced no final response".into()))?;
        Ok(ResearcherResponse {
            query_id: query.id,
            prompt_version: version.to_string(),
            response_text,
            plan_snapshot: plans
                .get(&session_id)
                .map(|p| p.snapshot())
                .unwrap_or(serde_json::Value::Null),
            tool_call_log,
        })
    }
}

/// Options for one evaluation run.
#[derive(Clone)]
pub struct EvalOptions {
    pub version: PromptVersion,
    /// Subset of query ids; `None` runs the full fixed set.
    pub query_ids: Option<Vec<u32>>,
    /// Fan-out parallelism.
    pub workers: usize,
    /// Force re-execution of every query.
    pub no_cache: bool,
    pub results_dir: ResultsDir,
}

/// Outcome of one evaluation run.
#[derive(Debug)]
pub struct EvalSummary {
    pub results: Vec<EvaluationResult>,
    /// Query ids skipped because of run or aggregation failures.
    pub skipped: Vec<u32>,
}

impl EvalSummary {
    /// Exit code: 0 on full success, 3 on partial failure.
    pub fn exit_code(&self) -> i32 {
        if self.skipped.is_empty() {
            0
        } else {
            3
        }
    }
}

async fn evaluate_one(
    options: &EvalOptions,
    runner: &Arc<dyn ResponseRunner>,
    judge_llm: &Arc<dyn LlmClient>,
    query: &EvalQuery,
) -> Result<EvaluationResult, EvalError> {
    let version = options.version.as_str();

    let response = match (!options.no_cache)
        .then(|| options.results_dir.read_response(version, query.id))
        .transpose()?
        .flatten()
    {
        Some(cached) => {
            info!(query_id = query.id, version, "response cache hit");
            cached
        }
        None => {
            let response = runner.run_query(&options.version, query).await?;
            options.results_dir.write_response(&response)?;
            response
        }
    };

    let decisions = match (!options.no_cache)
        .then(|| options.results_dir.read_evaluation(version, query.id))
        .transpose()?
        .flatten()
    {
        Some(cached) => cached,
        None => {
            let decisions =
                run_all_judges(judge_llm.as_ref(), query.text, &response.response_text).await?;
            options
                .results_dir
                .write_evaluation(version, query.id, &decisions)?;
            decisions
        }
    };

    aggregate(query.id, query.text, version, &decisions)
}

fn aggregated_summary(version: &str, results: &[EvaluationResult]) -> serde_json::Value {
    let mut rubric_means = serde_json::Map::new();
    for kind in JudgeKind::ALL {
        let name = kind.name();
        let scores: Vec<f64> = results.iter().filter_map(|r| r.rubric_score(name)).collect();
        let mean = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };
        rubric_means.insert(name.to_string(), serde_json::json!(mean));
    }
    serde_json::json!({
        "prompt_version": version,
        "query_count": results.len(),
        "rubric_means": rubric_means,
    })
}

/// Runs the evaluation for one prompt version and persists all artifacts.
pub async fn run_eval(
    options: EvalOptions,
    runner: Arc<dyn ResponseRunner>,
    judge_llm: Arc<dyn LlmClient>,
) -> Result<EvalSummary, EvalError> {
    if !known_versions().contains(&options.version.as_str()) {
        return Err(EvalError::UnknownVersion(options.version.to_string()));
    }
    let queries = match &options.query_ids {
        Some(ids) => queries_by_ids(ids)?,
        None => query_set(),
    };

    let semaphore = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut handles = Vec::with_capacity(queries.len());
    for query in queries {
        let semaphore = semaphore.clone();
        let options = options.clone();
        let runner = runner.clone();
        let judge_llm = judge_llm.clone();
        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let outcome = evaluate_one(&options, &runner, &judge_llm, &query).await;
            (query.id, outcome)
        }));
    }

    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for handle in handles {
        let (query_id, outcome) = handle
            .await
            .map_err(|e| EvalError::Run(format!("evaluation task panicked: {e}")))?;
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!(query_id, error = %e, "query skipped");
                skipped.push(query_id);
            }
        }
    }
    results.sort_by_key(|r| r.query_id);
    skipped.sort_unstable();

    let version = options.version.as_str();
    options.results_dir.write_results(version, &results)?;
    options
        .results_dir
        .write_aggregated(version, &aggregated_summary(version, &results))?;
    info!(
        version,
        completed = results.len(),
        skipped = skipped.len(),
        "evaluation finished"
    );
    Ok(EvalSummary { results, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tandem::llm::MockLlm;

    /// Fake runner that counts executions and answers deterministically.
    struct CountingRunner {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl ResponseRunner for CountingRunner {
        async fn run_query(
            &self,
            version: &PromptVersion,
            query: &EvalQuery,
        ) -> Result<ResearcherResponse, EvalError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(ResearcherResponse {
                query_id: query.id,
                prompt_version: version.to_string(),
                response_text: format!("answer to query {}", query.id),
                plan_snapshot: serde_json::Value::Null,
                tool_call_log: vec!["search_cached".into()],
            })
        }
    }

    fn judge_llm() -> Arc<dyn LlmClient> {
        Arc::new(MockLlm::fixed(r#"{"score": 1, "reasoning": "fine"}"#))
    }

    fn options(dir: &std::path::Path, ids: Vec<u32>, no_cache: bool) -> EvalOptions {
        EvalOptions {
            version: PromptVersion::benchmark(),
            query_ids: Some(ids),
            workers: 2,
            no_cache,
            results_dir: ResultsDir::new(dir),
        }
    }

    /// **Scenario**: S5-shaped run — three queries produce per-query response
    /// and evaluation files plus the typed results artifact, exit code 0.
    #[tokio::test]
    async fn eval_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(CountingRunner {
            runs: AtomicUsize::new(0),
        });
        let summary = run_eval(
            options(dir.path(), vec![1, 2, 3], false),
            runner.clone(),
            judge_llm(),
        )
        .await
        .unwrap();

        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.exit_code(), 0);
        for id in 1..=3 {
            assert!(dir.path().join(format!("response_benchmark_q{id}.json")).exists());
            assert!(dir
                .path()
                .join(format!("evaluation_benchmark_q{id}.json"))
                .exists());
        }
        assert!(dir.path().join("evaluation_results_benchmark.json").exists());
        assert!(dir.path().join("aggregated_benchmark.json").exists());

        let typed = ResultsDir::new(dir.path())
            .read_results("benchmark")
            .unwrap()
            .unwrap();
        assert_eq!(typed.len(), 3);
        let ids: Vec<u32> = typed.iter().map(|r| r.query_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    /// **Scenario**: cached queries are not re-executed; deleting one response
    /// artifact re-runs exactly that query; no_cache re-runs everything.
    #[tokio::test]
    async fn idempotent_caching() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(CountingRunner {
            runs: AtomicUsize::new(0),
        });
        run_eval(options(dir.path(), vec![1, 2], false), runner.clone(), judge_llm())
            .await
            .unwrap();
        assert_eq!(runner.runs.load(Ordering::SeqCst), 2);

        // Full cache hit: no new runs.
        run_eval(options(dir.path(), vec![1, 2], false), runner.clone(), judge_llm())
            .await
            .unwrap();
        assert_eq!(runner.runs.load(Ordering::SeqCst), 2);

        // Drop one artifact: exactly that query re-runs.
        std::fs::remove_file(dir.path().join("response_benchmark_q2.json")).unwrap();
        run_eval(options(dir.path(), vec![1, 2], false), runner.clone(), judge_llm())
            .await
            .unwrap();
        assert_eq!(runner.runs.load(Ordering::SeqCst), 3);

        // no_cache: everything re-runs.
        run_eval(options(dir.path(), vec![1, 2], true), runner.clone(), judge_llm())
            .await
            .unwrap();
        assert_eq!(runner.runs.load(Ordering::SeqCst), 5);
    }

    /// **Scenario**: a judge returning malformed output skips that query (exit
    /// 3) without contaminating the aggregate.
    #[tokio::test]
    async fn bad_judge_skips_query() {
        let dir = tempfile::tempdir().unwrap();
        let runner = Arc::new(CountingRunner {
            runs: AtomicUsize::new(0),
        });
        let bad_judge: Arc<dyn LlmClient> = Arc::new(MockLlm::fixed("not json at all"));
        let summary = run_eval(options(dir.path(), vec![4, 5], false), runner, bad_judge)
            .await
            .unwrap();
        assert!(summary.results.is_empty());
        assert_eq!(summary.skipped, vec![4, 5]);
        assert_eq!(summary.exit_code(), 3);
    }

    /// **Scenario**: unknown prompt versions refuse to run.
    #[tokio::test]
    async fn unknown_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let runner: Arc<dyn ResponseRunner> = Arc::new(CountingRunner {
            runs: AtomicUsize::new(0),
        });
        let mut opts = options(dir.path(), vec![1], false);
        opts.version = PromptVersion::new("challenger_7");
        let err = run_eval(opts, runner, judge_llm()).await.unwrap_err();
        assert!(matches!(err, EvalError::UnknownVersion(_)));
    }
}
