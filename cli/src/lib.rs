//! Command implementations for the `tandem` binary.
//!
//! Exit codes: 0 success, 2 usage (clap's default), 3 partial failure (some
//! queries skipped), and for `compare` 4 ADOPT / 5 REJECT / 6 INCONCLUSIVE so
//! scripts can branch on the recommendation.

use std::sync::Arc;

use tracing::error;

use config::TandemConfig;
use tandem::agent::{build_orchestrator, OrchestratorDeps};
use tandem::approval::ApprovalHub;
use tandem::cache::SqliteCitationCache;
use tandem::llm::{ChatOpenAI, LlmClient};
use tandem::memory::SqliteSaver;
use tandem::prompts::PromptVersion;
use tandem::tools::{PlanStore, SearchProvider, TavilySearch};
use tandem_eval::{compare, run_eval, EvalOptions, OrchestratorRunner, ResultsDir};

/// Exit code for usage errors the parser cannot catch (e.g. missing files).
pub const EXIT_USAGE: i32 = 2;

fn search_provider(cfg: &TandemConfig) -> Result<Arc<dyn SearchProvider>, String> {
    let key = cfg
        .tavily_api_key
        .clone()
        .ok_or("TAVILY_API_KEY is required for serving and evaluation runs")?;
    Ok(Arc::new(TavilySearch::new(key)))
}

fn require_openai(cfg: &TandemConfig) -> Result<(), String> {
    if cfg.openai_api_key.is_none() {
        return Err("OPENAI_API_KEY is required".to_string());
    }
    Ok(())
}

/// `tandem serve`: run the orchestrator behind the HTTP endpoints.
pub async fn cmd_serve(cfg: &TandemConfig, addr: Option<String>) -> i32 {
    if let Err(msg) = require_openai(cfg) {
        error!("{msg}");
        return EXIT_USAGE;
    }
    let search = match search_provider(cfg) {
        Ok(s) => s,
        Err(msg) => {
            error!("{msg}");
            return EXIT_USAGE;
        }
    };

    let cache = match SqliteCitationCache::new(&cfg.citation_db) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("citation cache: {e}");
            return 1;
        }
    };
    let checkpointer = match SqliteSaver::new(&cfg.checkpoint_db) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("checkpoint store: {e}");
            return 1;
        }
    };
    let plans = Arc::new(PlanStore::new());
    let approvals = Arc::new(ApprovalHub::new(cfg.approval_ttl_secs));

    let deps = OrchestratorDeps {
        llm_supervisor: Arc::new(ChatOpenAI::new(cfg.supervisor_model.clone())),
        llm_worker: Arc::new(ChatOpenAI::new(cfg.worker_model.clone())),
        search,
        cache,
        plans: plans.clone(),
        approvals: approvals.clone(),
        checkpointer: Some(checkpointer),
        workspace_root: cfg.workspace_dir.clone(),
        prompt_version: PromptVersion::benchmark(),
        auto_approve_max_bytes: cfg.auto_approve_max_bytes,
        max_worker_turns: cfg.max_worker_turns,
        extra_supervisor_tools: vec![],
    };
    let orchestrator = match build_orchestrator(deps) {
        Ok(o) => Arc::new(o),
        Err(e) => {
            // Configuration errors are fatal: refuse to start.
            error!("startup failed: {e}");
            return 1;
        }
    };

    let state = serve::AppState::new(orchestrator, approvals, plans);
    let addr = addr.unwrap_or_else(|| cfg.addr.clone());
    match serve::serve(&addr, state).await {
        Ok(()) => 0,
        Err(e) => {
            error!("server error: {e}");
            1
        }
    }
}

/// Parses `--queries 1,2,3` into ids.
pub fn parse_query_ids(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u32>().map_err(|_| format!("invalid query id: {s}")))
        .collect()
}

/// `tandem eval`: run the query set through one prompt version.
pub async fn cmd_eval(
    cfg: &TandemConfig,
    version: String,
    queries: Option<String>,
    workers: Option<usize>,
    no_cache: bool,
    results_dir: Option<String>,
) -> i32 {
    if let Err(msg) = require_openai(cfg) {
        error!("{msg}");
        return EXIT_USAGE;
    }
    let search = match search_provider(cfg) {
        Ok(s) => s,
        Err(msg) => {
            error!("{msg}");
            return EXIT_USAGE;
        }
    };
    let query_ids = match queries.as_deref().map(parse_query_ids).transpose() {
        Ok(ids) => ids,
        Err(msg) => {
            error!("{msg}");
            return EXIT_USAGE;
        }
    };

    let runner = Arc::new(OrchestratorRunner {
        llm_supervisor: Arc::new(ChatOpenAI::new(cfg.supervisor_model.clone())),
        llm_worker: Arc::new(ChatOpenAI::new(cfg.worker_model.clone())),
        search,
        workspace_root: cfg.workspace_dir.clone(),
        max_worker_turns: cfg.max_worker_turns,
    });
    let judge_llm: Arc<dyn LlmClient> =
        Arc::new(ChatOpenAI::new(cfg.judge_model.clone()).with_temperature(0.0));
    let options = EvalOptions {
        version: PromptVersion::new(version),
        query_ids,
        workers: workers.unwrap_or(cfg.eval_workers),
        no_cache,
        results_dir: ResultsDir::new(
            results_dir
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|| cfg.results_dir.clone()),
        ),
    };

    match run_eval(options, runner, judge_llm).await {
        Ok(summary) => {
            println!(
                "{} results, {} skipped",
                summary.results.len(),
                summary.skipped.len()
            );
            summary.exit_code()
        }
        Err(e) => {
            error!("evaluation failed: {e}");
            EXIT_USAGE
        }
    }
}

/// `tandem compare A B`: paired comparison of two evaluated versions.
pub fn cmd_compare(
    cfg: &TandemConfig,
    version_a: String,
    version_b: String,
    results_dir: Option<String>,
) -> i32 {
    let results = ResultsDir::new(
        results_dir
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| cfg.results_dir.clone()),
    );
    let read = |version: &str| match results.read_results(version) {
        Ok(Some(r)) => Ok(r),
        Ok(None) => Err(format!(
            "no evaluation results for version '{version}' under {}",
            results.root().display()
        )),
        Err(e) => Err(e.to_string()),
    };
    let a = match read(&version_a) {
        Ok(r) => r,
        Err(msg) => {
            error!("{msg}");
            return EXIT_USAGE;
        }
    };
    let b = match read(&version_b) {
        Ok(r) => r,
        Err(msg) => {
            error!("{msg}");
            return EXIT_USAGE;
        }
    };

    let report = match compare(&version_a, &a, &version_b, &b) {
        Ok(r) => r,
        Err(e) => {
            error!("comparison failed: {e}");
            return EXIT_USAGE;
        }
    };
    if let Err(e) = results.write_comparison(&version_a, &version_b, &report) {
        error!("failed to persist comparison: {e}");
        return 1;
    }
    match serde_json::to_string_pretty(&report) {
        Ok(body) => println!("{body}"),
        Err(e) => {
            error!("failed to render report: {e}");
            return 1;
        }
    }
    report.overall_recommendation.exit_code()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: query id lists parse with whitespace and reject junk.
    #[test]
    fn query_id_parsing() {
        assert_eq!(parse_query_ids("1,2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_query_ids(" 4 , 5 ").unwrap(), vec![4, 5]);
        assert!(parse_query_ids("1,x").is_err());
    }

    /// **Scenario**: compare on a directory without artifacts exits 2.
    #[test]
    fn compare_missing_artifacts_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("TANDEM_RESULTS_DIR", dir.path());
        let cfg = TandemConfig::from_env().unwrap();
        std::env::remove_var("TANDEM_RESULTS_DIR");
        let code = cmd_compare(&cfg, "benchmark".into(), "challenger_1".into(), None);
        assert_eq!(code, EXIT_USAGE);
    }
}
