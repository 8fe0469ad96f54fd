//! `POST /chat`: run one message and stream typed events as NDJSON.
//!
//! Defensive contract: per-chunk serialization errors, per-step orchestrator
//! errors, and approval-queue flush errors are each caught and turned into
//! `error` events; the terminal `stream_complete` is emitted from the pump's
//! cleanup path no matter how the run ended. A client disconnect cancels the
//! run at the next checkpoint boundary via the line channel closing.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use stream_event::{EnvelopeState, ErrorKind, ProtocolEvent};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use tandem::error::AgentError;
use tandem::graph::RunContext;
use tandem::memory::RunConfig;
use tandem::stream::StreamWriter;

use crate::app::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default)]
    pub auto_approve: bool,
    /// Forces plan-first behavior for this message.
    #[serde(default)]
    pub plan_mode: bool,
}

pub(crate) async fn chat(State(app): State<AppState>, Json(req): Json<ChatRequest>) -> Response {
    let (line_tx, line_rx) = mpsc::channel::<String>(app.defaults.line_queue_capacity);
    tokio::spawn(run_chat(app, req, line_tx));

    let body = Body::from_stream(
        ReceiverStream::new(line_rx).map(Ok::<_, std::convert::Infallible>),
    );
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        body,
    )
        .into_response()
}

/// Sends one event through the line channel with the envelope applied.
/// Returns false once the client is gone. Per-chunk failures are caught here
/// and replaced by an `error` event; they never tear the stream down.
async fn send_event(
    line_tx: &mpsc::Sender<String>,
    envelope: &mut EnvelopeState,
    event: &ProtocolEvent,
) -> bool {
    let line = match stream_event::to_json(event, envelope) {
        Ok(value) => format!("{value}\n"),
        Err(e) => {
            warn!(error = %e, "event serialization failed");
            let fallback = ProtocolEvent::Error {
                kind: ErrorKind::Chunk,
                message: format!("event serialization failed: {e}"),
            };
            match stream_event::to_json(&fallback, envelope) {
                Ok(value) => format!("{value}\n"),
                Err(_) => return true, // nothing serializable; drop the chunk
            }
        }
    };
    line_tx.send(line).await.is_ok()
}

/// The full run: orchestrate, pump events, flush approvals, and always finish
/// with exactly one `stream_complete`.
pub(crate) async fn run_chat(app: AppState, req: ChatRequest, line_tx: mpsc::Sender<String>) {
    let session_id = req.session_id.clone();
    let mut envelope = EnvelopeState::new(session_id.clone());

    let (event_tx, mut event_rx) =
        mpsc::channel::<ProtocolEvent>(app.defaults.event_queue_capacity);
    let cancel = CancellationToken::new();

    let message = if req.plan_mode {
        format!(
            "{}\n\n(Plan mode: create a research plan before answering.)",
            req.message
        )
    } else {
        req.message.clone()
    };
    let config = RunConfig::for_session(&session_id).with_auto_approve(req.auto_approve);
    let ctx = RunContext::new(config)
        .with_stream(StreamWriter::new(event_tx))
        .with_cancel(cancel.clone());

    let orchestrator = app.orchestrator.clone();
    let sessions = app.sessions.clone();
    let run_session = session_id.clone();
    let run_handle = tokio::spawn(async move {
        // Per-session serialization: one transition sequence at a time.
        let lock = sessions.lock_for(&run_session);
        let _guard = lock.lock().await;
        orchestrator.run(&message, &ctx).await
    });

    // Pump events until the orchestrator drops its writer. A dead client
    // cancels the run but the pump keeps draining so checkpoints finish.
    let mut client_alive = true;
    while let Some(event) = event_rx.recv().await {
        if client_alive {
            client_alive = send_event(&line_tx, &mut envelope, &event).await;
            if !client_alive {
                debug!(session_id = %session_id, "client disconnected; cancelling run");
                cancel.cancel();
            }
        }
    }

    // Per-step layer: the orchestrator's outcome, including panics.
    let run_error: Option<(ErrorKind, String)> = match run_handle.await {
        Ok(Ok(_state)) => None,
        Ok(Err(AgentError::Cancelled)) => {
            Some((ErrorKind::Cancelled, "run cancelled".to_string()))
        }
        Ok(Err(e)) => Some((ErrorKind::Step, e.to_string())),
        Err(join_error) => Some((ErrorKind::Fatal, format!("run task failed: {join_error}"))),
    };

    // Approval-flush layer: expire stale requests so every emitted
    // approval_request resolves before the stream completes. Tail emissions
    // are attempted even for a gone client; the channel just drops them.
    if let Some(queue) = app.approvals.existing_queue(&session_id) {
        for approval_id in queue.expire_stale().await {
            let resolved = ProtocolEvent::ApprovalResolved {
                approval_id,
                decision: "expired".to_string(),
            };
            send_event(&line_tx, &mut envelope, &resolved).await;
        }
    }

    let success = run_error.is_none();
    if let Some((kind, message)) = run_error {
        send_event(
            &line_tx,
            &mut envelope,
            &ProtocolEvent::Error { kind, message },
        )
        .await;
    }

    // Terminal event, unconditionally last.
    let complete = ProtocolEvent::StreamComplete {
        session_id: session_id.clone(),
        success,
    };
    send_event(&line_tx, &mut envelope, &complete).await;
}
