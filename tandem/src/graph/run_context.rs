//! Run context passed into nodes for streaming-aware execution.

use tokio_util::sync::CancellationToken;

use crate::memory::RunConfig;
use crate::stream::StreamWriter;

/// Context for one graph run: config, stream writer, cancellation.
///
/// The interpreter checks `cancel` at every node boundary; nodes and tools
/// may also check it at their own suspension points. `stream` is a no-op
/// writer for headless runs.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Config for the current run (session_id, checkpoint, auto_approve).
    pub config: RunConfig,
    /// Writer for typed stream events, in state-commit order.
    pub stream: StreamWriter,
    /// Cooperative cancellation; fired on client disconnect.
    pub cancel: CancellationToken,
}

impl RunContext {
    /// Creates a context with a no-op stream and a fresh cancellation token.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            stream: StreamWriter::noop(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_stream(mut self, stream: StreamWriter) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Session id from config, or "anonymous" for config-less runs.
    pub fn session_id(&self) -> &str {
        self.config.session_id.as_deref().unwrap_or("anonymous")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_falls_back() {
        let ctx = RunContext::new(RunConfig::default());
        assert_eq!(ctx.session_id(), "anonymous");
        let ctx = RunContext::new(RunConfig::for_session("s7"));
        assert_eq!(ctx.session_id(), "s7");
        assert!(!ctx.cancel.is_cancelled());
    }
}
