//! Scripted mock LLM for tests and offline orchestrator runs.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::AgentError;
use crate::message::Message;

use super::{LlmClient, LlmResponse};

/// Mock LLM that replays a scripted sequence of responses.
///
/// Each `invoke` pops the next scripted response; when the script is
/// exhausted it returns the configured fallback (default: an empty terminal
/// reply). This lets orchestrator tests drive multi-turn tool loops without a
/// provider.
pub struct MockLlm {
    script: Mutex<VecDeque<LlmResponse>>,
    fallback: LlmResponse,
}

impl MockLlm {
    /// Mock that always returns the same text reply.
    pub fn fixed(content: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: LlmResponse::text(content),
        }
    }

    /// Mock that replays `script` in order, then returns empty replies.
    pub fn scripted(script: Vec<LlmResponse>) -> Self {
        Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: LlmResponse::text(""),
        }
    }

    /// Overrides the reply used once the script is exhausted.
    pub fn with_fallback(mut self, fallback: LlmResponse) -> Self {
        self.fallback = fallback;
        self
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, _messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let next = self
            .script
            .lock()
            .map_err(|_| AgentError::ExecutionFailed("mock script lock poisoned".into()))?
            .pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolInvocation;

    /// **Scenario**: scripted responses replay in order, then the fallback.
    #[tokio::test]
    async fn scripted_replay_then_fallback() {
        let llm = MockLlm::scripted(vec![
            LlmResponse::with_calls(
                "searching",
                vec![ToolInvocation::new("search_cached", serde_json::json!({}))],
            ),
            LlmResponse::text("final"),
        ])
        .with_fallback(LlmResponse::text("exhausted"));

        let first = llm.invoke(&[]).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);
        let second = llm.invoke(&[]).await.unwrap();
        assert_eq!(second.content, "final");
        let third = llm.invoke(&[]).await.unwrap();
        assert_eq!(third.content, "exhausted");
        assert_eq!(llm.remaining(), 0);
    }

    /// **Scenario**: fixed mock repeats forever.
    #[tokio::test]
    async fn fixed_repeats() {
        let llm = MockLlm::fixed("same");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "same");
        assert_eq!(llm.invoke(&[]).await.unwrap().content, "same");
    }
}
