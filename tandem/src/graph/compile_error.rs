//! Compile-time validation errors for state graphs.
//!
//! Raised by `StateGraph::compile`; these are startup errors and refuse to
//! produce a runnable graph.

use thiserror::Error;

/// Errors from `StateGraph::compile`.
#[derive(Debug, Error)]
pub enum CompilationError {
    #[error("edge references unknown node: {0}")]
    NodeNotFound(String),
    #[error("no edge from START")]
    MissingStart,
    #[error("no path reaches END")]
    MissingEnd,
    #[error("node {0} has both an outgoing edge and conditional edges")]
    NodeHasBothEdgeAndConditional(String),
    #[error("conditional path map references unknown node: {0}")]
    InvalidConditionalPathMap(String),
    #[error("invalid graph: {0}")]
    InvalidChain(String),
}
