//! Next-step result from a graph node: continue linear chain, jump, or end.

/// Next step after running a node.
///
/// - **Continue**: follow the node's registered edge (or conditional router).
/// - **Node(id)**: jump to the given node.
/// - **End**: stop; return current state as final result.
///
/// **Interaction**: returned by `Node::run`; consumed by
/// `CompiledStateGraph::invoke`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Next {
    /// Follow the registered edge for the current node.
    Continue,
    /// Run the node with the given id next.
    Node(String),
    /// Stop and return the current state.
    End,
}
