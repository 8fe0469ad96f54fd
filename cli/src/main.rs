//! Tandem CLI binary: serve the orchestrator, run evaluations, compare
//! prompt versions.
//!
//! Subcommands: `serve`, `eval --version V`, `compare A B`.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::TandemConfig;

#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(about = "Tandem — hierarchical multi-agent research orchestration")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the chat, approval, and plan endpoints.
    Serve {
        /// Bind address (default: TANDEM_ADDR or 127.0.0.1:8080)
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,
    },
    /// Run the evaluation query set through one prompt version.
    Eval {
        /// Prompt version to evaluate (e.g. benchmark, challenger_1)
        #[arg(long, value_name = "VERSION")]
        version: String,
        /// Comma-separated query ids; default is the full fixed set
        #[arg(long, value_name = "ID,ID,…")]
        queries: Option<String>,
        /// Fan-out parallelism (default: TANDEM_EVAL_WORKERS or 4)
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// Re-execute every query, ignoring cached artifacts
        #[arg(long)]
        no_cache: bool,
        /// Artifact directory (default: TANDEM_RESULTS_DIR or eval_results)
        #[arg(long, value_name = "DIR")]
        results_dir: Option<String>,
    },
    /// Compare two evaluated prompt versions (exits 4 ADOPT / 5 REJECT / 6 INCONCLUSIVE).
    Compare {
        /// Baseline version
        version_a: String,
        /// Challenger version
        version_b: String,
        /// Artifact directory (default: TANDEM_RESULTS_DIR or eval_results)
        #[arg(long, value_name = "DIR")]
        results_dir: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() {
    // Env layering: process env > .env > ~/.config/tandem/config.toml.
    let _ = config::load_and_apply("tandem", None);
    init_tracing();

    let args = Args::parse();
    let cfg = match TandemConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("configuration error: {e}");
            std::process::exit(cli::EXIT_USAGE);
        }
    };

    let code = match args.cmd {
        Command::Serve { addr } => cli::cmd_serve(&cfg, addr).await,
        Command::Eval {
            version,
            queries,
            workers,
            no_cache,
            results_dir,
        } => cli::cmd_eval(&cfg, version, queries, workers, no_cache, results_dir).await,
        Command::Compare {
            version_a,
            version_b,
            results_dir,
        } => cli::cmd_compare(&cfg, version_a, version_b, results_dir),
    };
    std::process::exit(code);
}
