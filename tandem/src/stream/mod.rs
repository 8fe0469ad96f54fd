//! Stream writer: bridge from graph/tool execution to the typed event stream.
//!
//! Events are emitted in the same order as state mutations are committed; the
//! consumer (serve layer) injects the envelope and writes NDJSON lines. A
//! no-op writer keeps headless runs (evaluation) on the same code path.

use stream_event::ProtocolEvent;
use tokio::sync::mpsc;

/// Writer for typed stream events.
///
/// Cloneable; every agent node and session-aware tool holds one. Emission
/// awaits channel capacity (backpressure) and silently drops events once the
/// receiver is gone, so a disconnected client never fails a run mid-step.
#[derive(Clone)]
pub struct StreamWriter {
    tx: Option<mpsc::Sender<ProtocolEvent>>,
}

impl StreamWriter {
    /// Writer backed by a channel; the receiver side renders the stream.
    pub fn new(tx: mpsc::Sender<ProtocolEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// No-op writer for headless runs.
    pub fn noop() -> Self {
        Self { tx: None }
    }

    /// Emits one event. Returns whether the event was accepted.
    pub async fn emit(&self, event: ProtocolEvent) -> bool {
        match &self.tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }
}

impl std::fmt::Debug for StreamWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamWriter")
            .field("connected", &self.tx.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stream_event::ProtocolEvent;

    /// **Scenario**: events pass through the channel in emission order.
    #[tokio::test]
    async fn emits_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let writer = StreamWriter::new(tx);
        assert!(
            writer
                .emit(ProtocolEvent::LlmThinking {
                    agent: "supervisor".into(),
                    content: "first".into(),
                })
                .await
        );
        assert!(
            writer
                .emit(ProtocolEvent::LlmThinking {
                    agent: "supervisor".into(),
                    content: "second".into(),
                })
                .await
        );
        let first = rx.recv().await.unwrap();
        assert!(matches!(first, ProtocolEvent::LlmThinking { content, .. } if content == "first"));
    }

    /// **Scenario**: the noop writer accepts nothing but never errors.
    #[tokio::test]
    async fn noop_writer_drops_everything() {
        let writer = StreamWriter::noop();
        assert!(
            !writer
                .emit(ProtocolEvent::StreamComplete {
                    session_id: "s".into(),
                    success: true,
                })
                .await
        );
    }

    /// **Scenario**: a dropped receiver does not fail emission.
    #[tokio::test]
    async fn dropped_receiver_is_tolerated() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let writer = StreamWriter::new(tx);
        assert!(
            !writer
                .emit(ProtocolEvent::LlmThinking {
                    agent: "a".into(),
                    content: "c".into(),
                })
                .await
        );
    }
}
