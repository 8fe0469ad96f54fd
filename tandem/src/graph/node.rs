//! Graph node trait: one step in a StateGraph.
//!
//! Receives state `S`, returns updated `S` and `Next` (continue, jump, or
//! end). Agent nodes implement `run_with_context` to reach the stream writer
//! and run config.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::error::AgentError;

use super::{Next, RunContext};

/// One step in a graph: state in, (state out, next step).
///
/// The interpreter uses `Next` to choose the next node (Continue = registered
/// edge, Node(id) = jump, End = stop).
///
/// **Interaction**: implemented by agent nodes; see `StateGraph::add_node` and
/// `CompiledStateGraph::invoke`.
#[async_trait]
pub trait Node<S>: Send + Sync
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Node id (e.g. `"supervisor"`, `"researcher"`). Unique within a graph.
    fn id(&self) -> &str;

    /// One step: state in, (state out, next step).
    async fn run(&self, state: S) -> Result<(S, Next), AgentError>;

    /// Variant with run context (stream writer, config, cancellation).
    ///
    /// Default implementation calls `run` and ignores the context.
    async fn run_with_context(
        &self,
        state: S,
        _ctx: &RunContext,
    ) -> Result<(S, Next), AgentError> {
        self.run(state).await
    }
}
