//! `POST /approvals`: resolve a pending approval request.
//!
//! 200 on an accepted decision; 404 for unknown or already-resolved ids;
//! 410 when the request expired.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use tandem::approval::{ApprovalDecision, ApprovalError};

use crate::app::AppState;

#[derive(Debug, Deserialize)]
pub(crate) struct ApprovalRequestBody {
    pub session_id: String,
    pub approval_id: String,
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Decision {
    Approve,
    Reject,
}

impl From<Decision> for ApprovalDecision {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Approve => ApprovalDecision::Approve,
            Decision::Reject => ApprovalDecision::Reject,
        }
    }
}

pub(crate) async fn resolve(
    State(app): State<AppState>,
    Json(body): Json<ApprovalRequestBody>,
) -> Response {
    let Some(queue) = app.approvals.existing_queue(&body.session_id) else {
        return (StatusCode::NOT_FOUND, "unknown session").into_response();
    };
    match queue.resolve(&body.approval_id, body.decision.into()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(ApprovalError::Expired(_)) => (StatusCode::GONE, "approval expired").into_response(),
        Err(ApprovalError::UnknownId(_)) | Err(ApprovalError::AlreadyResolved(_)) => {
            (StatusCode::NOT_FOUND, "unknown or resolved approval").into_response()
        }
    }
}
