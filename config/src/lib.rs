//! Load configuration from XDG `config.toml` and project `.env`, then apply to
//! the process environment with priority: **existing env > .env > XDG**.
//!
//! On top of the raw env layer, [`TandemConfig`] is the typed configuration
//! surface the rest of the workspace reads: model identifiers, provider
//! credentials, store paths, pool sizes, and approval settings. The core
//! crates never read `std::env` directly; they take a `TandemConfig`.

mod env_file;
mod xdg_toml;

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
    #[error("invalid config value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Loads config from XDG `config.toml` and optional project `.env`, then sets
/// environment variables only for keys that are **not** already set (so
/// existing env has highest priority).
///
/// Order of precedence when a key is missing in the process environment:
/// 1. Value from project `.env` (current directory or `override_dir` if given)
/// 2. Value from `$XDG_CONFIG_HOME/<app_name>/config.toml` `[env]` table
pub fn load_and_apply(app_name: &str, override_dir: Option<&Path>) -> Result<(), LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = env_file::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;

    let mut keys: std::collections::HashSet<String> = xdg_map.keys().cloned().collect();
    keys.extend(dotenv_map.keys().cloned());

    for key in keys {
        if std::env::var(&key).is_ok() {
            continue; // existing env wins
        }
        let value = dotenv_map.get(&key).or_else(|| xdg_map.get(&key)).cloned();
        if let Some(v) = value {
            std::env::set_var(&key, v);
        }
    }

    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &'static str, default: T) -> Result<T, LoadError> {
    match std::env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse()
            .map_err(|_| LoadError::Invalid { key, value: raw }),
    }
}

/// Typed configuration for the whole workspace.
///
/// Built by [`TandemConfig::from_env`] after [`load_and_apply`]. Provider
/// credentials stay optional here: serving requires them, but evaluation
/// against cached artifacts and all tests run without any.
#[derive(Debug, Clone)]
pub struct TandemConfig {
    /// Chat model for the supervisor agent (`TANDEM_SUPERVISOR_MODEL`).
    pub supervisor_model: String,
    /// Chat model for worker agents (`TANDEM_WORKER_MODEL`).
    pub worker_model: String,
    /// Chat model for evaluation judges (`TANDEM_JUDGE_MODEL`).
    pub judge_model: String,
    /// OpenAI-compatible API key (`OPENAI_API_KEY`).
    pub openai_api_key: Option<String>,
    /// Tavily search API key (`TAVILY_API_KEY`).
    pub tavily_api_key: Option<String>,
    /// SQLite file for graph checkpoints (`TANDEM_CHECKPOINT_DB`).
    pub checkpoint_db: PathBuf,
    /// SQLite file for the citation cache (`TANDEM_CITATION_DB`).
    pub citation_db: PathBuf,
    /// Root of the file-tool sandbox (`TANDEM_WORKSPACE_DIR`).
    pub workspace_dir: PathBuf,
    /// Directory for evaluation artifacts (`TANDEM_RESULTS_DIR`).
    pub results_dir: PathBuf,
    /// Approval request time-to-live in seconds (`TANDEM_APPROVAL_TTL_SECS`).
    pub approval_ttl_secs: u64,
    /// Auto-approve bypass threshold in bytes (`TANDEM_AUTO_APPROVE_MAX_BYTES`).
    pub auto_approve_max_bytes: usize,
    /// Evaluation fan-out parallelism (`TANDEM_EVAL_WORKERS`).
    pub eval_workers: usize,
    /// Max reasoning turns per worker invocation (`TANDEM_MAX_WORKER_TURNS`).
    pub max_worker_turns: u32,
    /// Server bind address (`TANDEM_ADDR`).
    pub addr: String,
}

impl TandemConfig {
    /// Reads the typed config from the process environment, with defaults for
    /// everything except credentials (which stay `None` when unset).
    pub fn from_env() -> Result<Self, LoadError> {
        let state_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tandem");
        Ok(Self {
            supervisor_model: env_or("TANDEM_SUPERVISOR_MODEL", "gpt-4o"),
            worker_model: env_or("TANDEM_WORKER_MODEL", "gpt-4o"),
            judge_model: env_or("TANDEM_JUDGE_MODEL", "gpt-4o-mini"),
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            tavily_api_key: std::env::var("TAVILY_API_KEY").ok(),
            checkpoint_db: std::env::var("TANDEM_CHECKPOINT_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| state_dir.join("checkpoints.db")),
            citation_db: std::env::var("TANDEM_CITATION_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| state_dir.join("citations.db")),
            workspace_dir: std::env::var("TANDEM_WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/workspace")),
            results_dir: std::env::var("TANDEM_RESULTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("eval_results")),
            approval_ttl_secs: env_parse("TANDEM_APPROVAL_TTL_SECS", 300)?,
            auto_approve_max_bytes: env_parse("TANDEM_AUTO_APPROVE_MAX_BYTES", 64 * 1024)?,
            eval_workers: env_parse("TANDEM_EVAL_WORKERS", 4)?,
            max_worker_turns: env_parse("TANDEM_MAX_WORKER_TURNS", 24)?,
            addr: env_or("TANDEM_ADDR", "127.0.0.1:8080"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn restore_var(key: &str, prev: Option<String>) {
        match prev {
            Some(v) => env::set_var(key, v),
            None => env::remove_var(key),
        }
    }

    #[test]
    fn existing_env_wins() {
        env::set_var("CONFIG_TEST_EXISTING", "from_env");
        let _ = load_and_apply("tandem", None);
        assert_eq!(env::var("CONFIG_TEST_EXISTING").as_deref(), Ok("from_env"));
        env::remove_var("CONFIG_TEST_EXISTING");
    }

    #[test]
    fn load_and_apply_no_config_ok() {
        let r = load_and_apply("config-crate-nonexistent-app-xyz", None::<&std::path::Path>);
        assert!(r.is_ok());
    }

    #[test]
    fn dotenv_overrides_xdg() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("tandem");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(
            app_dir.join("config.toml"),
            "[env]\nCONFIG_TEST_PRIORITY = \"from_xdg\"\n",
        )
        .unwrap();

        let dotenv_dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dotenv_dir.path().join(".env"),
            "CONFIG_TEST_PRIORITY=from_dotenv\n",
        )
        .unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());
        env::remove_var("CONFIG_TEST_PRIORITY");

        let _ = load_and_apply("tandem", Some(dotenv_dir.path()));
        let val = env::var("CONFIG_TEST_PRIORITY").unwrap();
        env::remove_var("CONFIG_TEST_PRIORITY");
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert_eq!(val, "from_dotenv");
    }

    #[test]
    fn from_env_defaults_without_credentials() {
        let prev_key = env::var("OPENAI_API_KEY").ok();
        let prev_workers = env::var("TANDEM_EVAL_WORKERS").ok();
        env::remove_var("OPENAI_API_KEY");
        env::remove_var("TANDEM_EVAL_WORKERS");

        let cfg = TandemConfig::from_env().unwrap();
        restore_var("OPENAI_API_KEY", prev_key);
        restore_var("TANDEM_EVAL_WORKERS", prev_workers);

        assert!(cfg.openai_api_key.is_none());
        assert_eq!(cfg.eval_workers, 4);
        assert_eq!(cfg.approval_ttl_secs, 300);
    }

    #[test]
    fn from_env_rejects_unparseable_number() {
        let prev = env::var("TANDEM_EVAL_WORKERS").ok();
        env::set_var("TANDEM_EVAL_WORKERS", "not-a-number");
        let result = TandemConfig::from_env();
        restore_var("TANDEM_EVAL_WORKERS", prev);
        assert!(matches!(result, Err(LoadError::Invalid { key, .. }) if key == "TANDEM_EVAL_WORKERS"));
    }

    #[test]
    fn invalid_xdg_toml_fails_with_xdg_parse_error() {
        let xdg_dir = tempfile::tempdir().unwrap();
        let app_dir = xdg_dir.path().join("tandem");
        std::fs::create_dir_all(&app_dir).unwrap();
        std::fs::write(app_dir.join("config.toml"), "invalid [[[\n").unwrap();

        let prev_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", xdg_dir.path());

        let result = load_and_apply("tandem", None::<&std::path::Path>);
        restore_var("XDG_CONFIG_HOME", prev_xdg);

        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
