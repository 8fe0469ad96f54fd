//! Agent execution error types.
//!
//! Used by `Node::run` and the agent loops.

use thiserror::Error;

/// Agent execution error.
///
/// Returned by graph nodes and agent steps when execution fails. Recoverable
/// tool failures never become this error; they are fed back to the agent as
/// structured tool results. This type is for step-level failures the graph
/// interpreter must see.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The run was cancelled at a suspension point; the interpreter has
    /// checkpointed the state and issues no further LLM calls.
    #[error("run cancelled")]
    Cancelled,
}
