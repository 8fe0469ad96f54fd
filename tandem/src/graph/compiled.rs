//! Compiled state graph: immutable interpreter over the node/edge structure.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. The run
//! loop steps through nodes, checkpointing the whole state at every node
//! boundary and checking cancellation before each node. A cancelled run saves
//! a final checkpoint and returns `AgentError::Cancelled`; re-invoking with
//! the same session id resumes from that snapshot.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointError, CheckpointSource, Checkpointer, RunConfig};

use super::conditional::NextEntry;
use super::state_graph::END;
use super::{Next, Node, RunContext};

/// Compiled graph: immutable structure, supports invoke.
///
/// Runs from the first node; uses each node's returned `Next` or the
/// conditional router to choose the next node. When a checkpointer is set and
/// `config.session_id` is provided, state is saved at every boundary.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    first_node_id: String,
    next_map: HashMap<String, NextEntry<S>>,
    checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    max_steps: usize,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub(super) fn new(
        nodes: HashMap<String, Arc<dyn Node<S>>>,
        first_node_id: String,
        next_map: HashMap<String, NextEntry<S>>,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
        max_steps: usize,
    ) -> Self {
        Self {
            nodes,
            first_node_id,
            next_map,
            checkpointer,
            max_steps,
        }
    }

    /// Latest checkpointed state for the session in `config`, if any.
    ///
    /// Callers use this to resume: load, merge the new input into the state,
    /// then `invoke`.
    pub async fn latest_state(&self, config: &RunConfig) -> Result<Option<S>, CheckpointError> {
        match (&self.checkpointer, &config.session_id) {
            (Some(cp), Some(_)) => Ok(cp.latest(config).await?.map(|c| c.state)),
            _ => Ok(None),
        }
    }

    async fn save_checkpoint(
        &self,
        config: &RunConfig,
        state: &S,
        source: CheckpointSource,
        step: i64,
    ) {
        let (Some(cp), Some(_)) = (&self.checkpointer, &config.session_id) else {
            return;
        };
        let checkpoint = Checkpoint::from_state(state.clone(), source, step);
        if let Err(e) = cp.put(config, &checkpoint).await {
            // A failed snapshot must not kill the run; the next boundary retries.
            warn!(error = %e, step, "checkpoint save failed");
        }
    }

    /// Runs the graph to completion from `state`.
    ///
    /// Suspension points: every node boundary. Cancellation observed there
    /// saves an interrupt checkpoint and returns `AgentError::Cancelled`
    /// without running further nodes.
    pub async fn invoke(&self, state: S, ctx: &RunContext) -> Result<S, AgentError> {
        let mut state = state;
        let mut current_id = self.first_node_id.clone();
        let mut step: i64 = 0;

        self.save_checkpoint(&ctx.config, &state, CheckpointSource::Input, -1)
            .await;

        loop {
            if step as usize >= self.max_steps {
                return Err(AgentError::ExecutionFailed(format!(
                    "graph exceeded {} steps without reaching END",
                    self.max_steps
                )));
            }
            if ctx.cancel.is_cancelled() {
                debug!(node = %current_id, "run cancelled at node boundary");
                self.save_checkpoint(&ctx.config, &state, CheckpointSource::Interrupt, step)
                    .await;
                return Err(AgentError::Cancelled);
            }

            let node = self
                .nodes
                .get(&current_id)
                .ok_or_else(|| {
                    AgentError::ExecutionFailed(format!("unknown node: {current_id}"))
                })?
                .clone();

            debug!(node = %current_id, step, "node start");
            let (new_state, next) = node.run_with_context(state, ctx).await?;
            state = new_state;
            debug!(node = %current_id, step, "node complete");

            self.save_checkpoint(&ctx.config, &state, CheckpointSource::Boundary, step)
                .await;
            step += 1;

            let next_id = match next {
                Next::End => END.to_string(),
                Next::Node(id) => id,
                Next::Continue => match self.next_map.get(&current_id) {
                    Some(NextEntry::Unconditional(to)) => to.clone(),
                    Some(NextEntry::Conditional(router)) => router.resolve_next(&state),
                    None => END.to_string(),
                },
            };
            if next_id == END {
                return Ok(state);
            }
            if !self.nodes.contains_key(&next_id) {
                return Err(AgentError::ExecutionFailed(format!(
                    "routing to unknown node: {next_id}"
                )));
            }
            current_id = next_id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{StateGraph, START};
    use crate::memory::MemorySaver;
    use async_trait::async_trait;
    use std::sync::Arc;

    #[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
    struct CounterState {
        hops: Vec<String>,
    }

    struct HopNode {
        id: &'static str,
        next: Next,
    }

    #[async_trait]
    impl Node<CounterState> for HopNode {
        fn id(&self) -> &str {
            self.id
        }
        async fn run(&self, mut state: CounterState) -> Result<(CounterState, Next), AgentError> {
            state.hops.push(self.id.to_string());
            Ok((state, self.next.clone()))
        }
    }

    fn linear_graph() -> StateGraph<CounterState> {
        let mut graph = StateGraph::new();
        graph.add_node(
            "a",
            Arc::new(HopNode {
                id: "a",
                next: Next::Continue,
            }),
        );
        graph.add_node(
            "b",
            Arc::new(HopNode {
                id: "b",
                next: Next::Continue,
            }),
        );
        graph.add_edge(START, "a");
        graph.add_edge("a", "b");
        graph.add_edge("b", END);
        graph
    }

    /// **Scenario**: a linear graph visits nodes in edge order.
    #[tokio::test]
    async fn linear_invoke_visits_in_order() {
        let compiled = linear_graph().compile().unwrap();
        let ctx = RunContext::new(RunConfig::default());
        let out = compiled.invoke(CounterState::default(), &ctx).await.unwrap();
        assert_eq!(out.hops, vec!["a", "b"]);
    }

    /// **Scenario**: conditional edges route by state; END stops the run.
    #[tokio::test]
    async fn conditional_routing() {
        let mut graph: StateGraph<CounterState> = StateGraph::new();
        graph.add_node(
            "router",
            Arc::new(HopNode {
                id: "router",
                next: Next::Continue,
            }),
        );
        graph.add_node(
            "odd",
            Arc::new(HopNode {
                id: "odd",
                next: Next::End,
            }),
        );
        graph.add_edge(START, "router");
        graph.add_edge("odd", END);
        graph.add_conditional_edges(
            "router",
            Arc::new(|s: &CounterState| {
                if s.hops.len() % 2 == 1 {
                    "odd".to_string()
                } else {
                    END.to_string()
                }
            }),
            None,
        );
        let compiled = graph.compile().unwrap();
        let ctx = RunContext::new(RunConfig::default());
        let out = compiled.invoke(CounterState::default(), &ctx).await.unwrap();
        assert_eq!(out.hops, vec!["router", "odd"]);
    }

    /// **Scenario**: every node boundary checkpoints; resume sees the final state.
    #[tokio::test]
    async fn checkpoints_at_every_boundary() {
        let saver = Arc::new(MemorySaver::<CounterState>::new());
        let compiled = linear_graph()
            .compile_with_checkpointer(saver.clone())
            .unwrap();
        let config = RunConfig::for_session("s1");
        let ctx = RunContext::new(config.clone());
        compiled.invoke(CounterState::default(), &ctx).await.unwrap();

        // input + one per node
        let items = saver.list(&config, None).await.unwrap();
        assert_eq!(items.len(), 3);
        let resumed = compiled.latest_state(&config).await.unwrap().unwrap();
        assert_eq!(resumed.hops, vec!["a", "b"]);
    }

    /// **Scenario**: a pre-cancelled run performs no node work, saves an
    /// interrupt checkpoint, and reports Cancelled.
    #[tokio::test]
    async fn cancellation_at_boundary() {
        let saver = Arc::new(MemorySaver::<CounterState>::new());
        let compiled = linear_graph()
            .compile_with_checkpointer(saver.clone())
            .unwrap();
        let config = RunConfig::for_session("s1");
        let ctx = RunContext::new(config.clone());
        ctx.cancel.cancel();
        let err = compiled
            .invoke(CounterState::default(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
        let resumed = compiled.latest_state(&config).await.unwrap().unwrap();
        assert!(resumed.hops.is_empty());
    }

    /// **Scenario**: a cycle without END trips the step bound.
    #[tokio::test]
    async fn max_steps_guard() {
        let mut graph: StateGraph<CounterState> = StateGraph::new();
        graph.add_node(
            "loopy",
            Arc::new(HopNode {
                id: "loopy",
                next: Next::Node("loopy".to_string()),
            }),
        );
        graph.add_edge(START, "loopy");
        graph.add_edge("loopy", END);
        let compiled = graph.with_max_steps(5).compile().unwrap();
        let ctx = RunContext::new(RunConfig::default());
        let err = compiled
            .invoke(CounterState::default(), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ExecutionFailed(msg) if msg.contains("5 steps")));
    }
}
