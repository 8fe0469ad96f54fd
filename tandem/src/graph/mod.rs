//! State graph: build and run stateful agent graphs.
//!
//! One shared state type flows through nodes (state-in, state-out). Build
//! with [`StateGraph`]: `add_node` / `add_edge` (with [`START`] / [`END`])
//! plus `add_conditional_edges` for state-based routing, then `compile()` or
//! `compile_with_checkpointer()` for a [`CompiledStateGraph`].
//!
//! The compiled interpreter checkpoints the whole state at every node
//! boundary and honors cancellation at the next boundary, so a session can be
//! resumed exactly where it left off.

mod compile_error;
mod compiled;
mod conditional;
mod next;
mod node;
mod run_context;
mod state_graph;

pub use compile_error::CompilationError;
pub use compiled::CompiledStateGraph;
pub use conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
pub use next::Next;
pub use node::Node;
pub use run_context::RunContext;
pub use state_graph::{StateGraph, END, START};
