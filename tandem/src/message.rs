//! Message types for agent state.
//!
//! Roles: System, User, Assistant, Tool. Assistant messages may carry an
//! ordered list of tool invocations, each with a unique invocation id; Tool
//! messages answer exactly one invocation id.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single tool invocation requested by an assistant message.
///
/// `id` is unique within the session message log; the answering
/// [`Message::Tool`] references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Unique invocation id (uuid v4).
    pub id: String,
    /// Tool name as registered for the invoking agent's role.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: Value,
}

impl ToolInvocation {
    /// Creates an invocation with a fresh uuid id.
    pub fn new(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single message in the conversation log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Message {
    /// System prompt; typically first in the list.
    System(String),
    /// User input.
    User(String),
    /// Agent reply: text content plus any requested tool invocations.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolInvocation>,
    },
    /// Result of one tool invocation; answers `invocation_id`.
    Tool {
        invocation_id: String,
        name: String,
        content: String,
        #[serde(default)]
        is_error: bool,
    },
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::System(content.into())
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::User(content.into())
    }

    /// Creates an assistant message with no tool calls.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    /// Creates an assistant message carrying tool invocations.
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_calls,
        }
    }

    /// Creates a tool result answering `invocation_id`.
    pub fn tool_result(
        invocation_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            invocation_id: invocation_id.into(),
            name: name.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Creates a structured tool error answering `invocation_id`.
    pub fn tool_error(
        invocation_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self::Tool {
            invocation_id: invocation_id.into(),
            name: name.into(),
            content: content.into(),
            is_error: true,
        }
    }

    /// Tool invocations carried by this message (empty for non-assistant roles).
    pub fn tool_calls(&self) -> &[ToolInvocation] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Text content of this message regardless of role.
    pub fn content(&self) -> &str {
        match self {
            Message::System(c) | Message::User(c) => c,
            Message::Assistant { content, .. } => content,
            Message::Tool { content, .. } => content,
        }
    }
}

/// Returns the content of the chronologically last assistant message, if any.
pub fn last_assistant_reply(messages: &[Message]) -> Option<&str> {
    messages.iter().rev().find_map(|m| match m {
        Message::Assistant { content, .. } => Some(content.as_str()),
        _ => None,
    })
}
