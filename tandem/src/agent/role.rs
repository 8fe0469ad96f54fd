//! Agent roles: the supervisor and the five specialized workers.

use serde::{Deserialize, Serialize};

/// Role of a worker agent. Each role carries its own tool set and prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerRole {
    Researcher,
    DataScientist,
    ExpertAnalyst,
    Writer,
    Reviewer,
}

impl WorkerRole {
    /// All worker roles, in delegation-node registration order.
    pub const ALL: [WorkerRole; 5] = [
        WorkerRole::Researcher,
        WorkerRole::DataScientist,
        WorkerRole::ExpertAnalyst,
        WorkerRole::Writer,
        WorkerRole::Reviewer,
    ];

    /// Graph node id for this worker.
    pub fn node_id(&self) -> &'static str {
        match self {
            WorkerRole::Researcher => "researcher",
            WorkerRole::DataScientist => "data_scientist",
            WorkerRole::ExpertAnalyst => "expert_analyst",
            WorkerRole::Writer => "writer",
            WorkerRole::Reviewer => "reviewer",
        }
    }

    /// Name of the supervisor tool that delegates to this worker.
    pub fn delegation_tool(&self) -> &'static str {
        match self {
            WorkerRole::Researcher => "delegate_to_researcher",
            WorkerRole::DataScientist => "delegate_to_data_scientist",
            WorkerRole::ExpertAnalyst => "delegate_to_expert_analyst",
            WorkerRole::Writer => "delegate_to_writer",
            WorkerRole::Reviewer => "delegate_to_reviewer",
        }
    }

    /// Resolves a worker from its delegation tool name.
    pub fn from_delegation_tool(name: &str) -> Option<WorkerRole> {
        WorkerRole::ALL
            .into_iter()
            .find(|r| r.delegation_tool() == name)
    }
}

/// Role of any agent in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Supervisor,
    Worker(WorkerRole),
}

impl AgentRole {
    pub fn node_id(&self) -> &'static str {
        match self {
            AgentRole::Supervisor => "supervisor",
            AgentRole::Worker(w) => w.node_id(),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.node_id())
    }
}
