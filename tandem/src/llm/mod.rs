//! LLM client abstraction for agent turns.
//!
//! Agent nodes depend on a callable that returns assistant text and optional
//! tool invocations; this module defines the trait, a scripted mock, and an
//! OpenAI-compatible implementation.

mod mock;
mod openai;

pub use mock::MockLlm;
pub use openai::ChatOpenAI;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::{Message, ToolInvocation};

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Response from one LLM completion: assistant text and optional tool calls.
///
/// **Interaction**: returned by `LlmClient::invoke`; agent nodes write
/// `content` into a new assistant message and execute `tool_calls`.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool invocations for this turn; empty means a terminal reply.
    pub tool_calls: Vec<ToolInvocation>,
    /// Token usage for this call, when the provider returns it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Terminal text reply without tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            usage: None,
        }
    }

    /// Reply that requests tool invocations.
    pub fn with_calls(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text and optional tool calls.
///
/// Implementations: [`MockLlm`] (scripted, for tests and offline runs),
/// [`ChatOpenAI`] (real API). Judges pin temperature 0 via
/// `ChatOpenAI::with_temperature`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// One turn: read messages, return assistant content and tool calls.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Scenario**: constructors populate content/tool_calls as expected.
    #[test]
    fn response_constructors() {
        let r = LlmResponse::text("done");
        assert_eq!(r.content, "done");
        assert!(r.tool_calls.is_empty());

        let call = ToolInvocation::new("search_cached", serde_json::json!({"query": "q"}));
        let r = LlmResponse::with_calls("", vec![call]);
        assert_eq!(r.tool_calls.len(), 1);
    }
}
