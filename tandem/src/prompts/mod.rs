//! Prompt versions as first-class values.
//!
//! Prompt text is embedded and looked up by explicit
//! `(version, role)` through [`get_prompt`]; there is no ambient default
//! prompt. Unknown versions and unregistered pairs are errors, so an
//! evaluation run can never silently pick up the wrong prompt body.

mod text;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::agent::role::{AgentRole, WorkerRole};

/// Errors from prompt lookup.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("unknown prompt version: {0}")]
    UnknownVersion(String),
    #[error("no prompt registered for version {version} role {role}")]
    UnknownRole { version: String, role: String },
}

/// A prompt version identifier (e.g. `benchmark`, `challenger_1`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromptVersion(String);

impl PromptVersion {
    /// The baseline version every comparison measures against.
    pub fn benchmark() -> Self {
        Self("benchmark".to_string())
    }

    /// The first challenger version.
    pub fn challenger_1() -> Self {
        Self("challenger_1".to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PromptVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

static REGISTRY: Lazy<HashMap<(&'static str, AgentRole), &'static str>> = Lazy::new(|| {
    let mut m: HashMap<(&'static str, AgentRole), &'static str> = HashMap::new();
    for version in ["benchmark", "challenger_1"] {
        m.insert((version, AgentRole::Supervisor), text::SUPERVISOR);
        m.insert(
            (version, AgentRole::Worker(WorkerRole::DataScientist)),
            text::DATA_SCIENTIST,
        );
        m.insert(
            (version, AgentRole::Worker(WorkerRole::ExpertAnalyst)),
            text::EXPERT_ANALYST,
        );
        m.insert(
            (version, AgentRole::Worker(WorkerRole::Writer)),
            text::WRITER,
        );
        m.insert(
            (version, AgentRole::Worker(WorkerRole::Reviewer)),
            text::REVIEWER,
        );
    }
    // The researcher prompt is what the versions compare.
    m.insert(
        ("benchmark", AgentRole::Worker(WorkerRole::Researcher)),
        text::RESEARCHER_BENCHMARK,
    );
    m.insert(
        ("challenger_1", AgentRole::Worker(WorkerRole::Researcher)),
        text::RESEARCHER_CHALLENGER_1,
    );
    m
});

/// Known version identifiers, for CLI validation.
pub fn known_versions() -> Vec<&'static str> {
    vec!["benchmark", "challenger_1"]
}

/// Looks up the system prompt for `(version, role)`.
///
/// Errors distinguish an unknown version from a version that exists but has
/// no prompt for the role.
pub fn get_prompt(version: &PromptVersion, role: AgentRole) -> Result<&'static str, PromptError> {
    if !known_versions().contains(&version.as_str()) {
        return Err(PromptError::UnknownVersion(version.as_str().to_string()));
    }
    REGISTRY
        .get(&(version.as_str(), role))
        .copied()
        .ok_or_else(|| PromptError::UnknownRole {
            version: version.as_str().to_string(),
            role: role.to_string(),
        })
}
