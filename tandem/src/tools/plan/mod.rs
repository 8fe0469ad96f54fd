//! Plan tools: create, update progress, read, edit.
//!
//! Plans are session-scoped and live in a shared [`PlanStore`]. Every
//! mutation emits a `plan_update` event with the full snapshot so clients can
//! render progress without polling.

mod create_plan;
mod edit_plan;
mod read_plan;
mod store;
mod update_progress;

pub use create_plan::{CreatePlanTool, TOOL_CREATE_PLAN};
pub use edit_plan::{EditPlanTool, TOOL_EDIT_PLAN};
pub use read_plan::{ReadPlanTool, TOOL_READ_PLAN};
pub use store::PlanStore;
pub use update_progress::{UpdatePlanProgressTool, TOOL_UPDATE_PLAN_PROGRESS};

use crate::plan::PlanError;
use crate::tools::ToolSourceError;

impl From<PlanError> for ToolSourceError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::NotFound => ToolSourceError::InvalidInput("no plan exists yet".to_string()),
            other => ToolSourceError::InvalidInput(other.to_string()),
        }
    }
}
