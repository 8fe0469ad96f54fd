//! Shared application state.

use std::sync::Arc;

use tandem::agent::{Orchestrator, SessionRegistry};
use tandem::approval::ApprovalHub;
use tandem::tools::PlanStore;

/// Serving defaults applied to every run.
#[derive(Debug, Clone)]
pub struct RunConfigDefaults {
    /// Event queue capacity between the orchestrator and the response pump.
    pub event_queue_capacity: usize,
    /// Line queue capacity between the pump and the HTTP body.
    pub line_queue_capacity: usize,
}

impl Default for RunConfigDefaults {
    fn default() -> Self {
        Self {
            event_queue_capacity: 256,
            line_queue_capacity: 64,
        }
    }
}

/// State shared by all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: Arc<SessionRegistry>,
    pub approvals: Arc<ApprovalHub>,
    pub plans: Arc<PlanStore>,
    pub defaults: RunConfigDefaults,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        approvals: Arc<ApprovalHub>,
        plans: Arc<PlanStore>,
    ) -> Self {
        Self {
            orchestrator,
            sessions: Arc::new(SessionRegistry::new()),
            approvals,
            plans,
            defaults: RunConfigDefaults::default(),
        }
    }
}
