//! Compiled state graph: immutable, supports invoke and stream.
//!
//! Built by `StateGraph::compile` or `compile_with_checkpointer`. When a checkpointer is
//! set and the config carries a `thread_id`, the final state is saved after each run and
//! the pre-step state (with the interrupt attached) is saved when a node interrupts.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use crate::memory::{Checkpoint, CheckpointSource, Checkpointer, RunnableConfig};
use crate::stream::{CheckpointEvent, StreamEvent, StreamMode};

use super::interrupt::Interrupt;
use super::logging::{
    log_graph_complete, log_graph_error, log_graph_start, log_node_complete, log_node_start,
};
use super::state_graph::END;
use super::{Next, NextEntry, Node, RunContext};

/// Event stream of a spawned run plus the handle yielding its final state.
pub type StreamHandle<S> = (
    ReceiverStream<StreamEvent<S>>,
    JoinHandle<Result<S, AgentError>>,
);

/// Compiled graph: immutable structure, runs from the START target.
///
/// After each node the conditional router (when the node has one) picks the next node;
/// otherwise the node's returned `Next` is used.
#[derive(Clone)]
pub struct CompiledStateGraph<S> {
    pub(super) nodes: HashMap<String, Arc<dyn Node<S>>>,
    pub(super) first_node_id: String,
    pub(super) next_map: HashMap<String, NextEntry<S>>,
    pub(super) checkpointer: Option<Arc<dyn Checkpointer<S>>>,
}

impl<S> CompiledStateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Checkpointer the graph was compiled with, if any.
    pub fn checkpointer(&self) -> Option<&Arc<dyn Checkpointer<S>>> {
        self.checkpointer.as_ref()
    }

    /// Runs the graph with the given state.
    ///
    /// - `Next::Continue`: follow the node's outgoing edge, or end when there is none.
    /// - `Next::Node(id)`: run the node with that id next.
    /// - `Next::End`: stop and return current state.
    ///
    /// Pass `None` for config to run without persistence.
    pub async fn invoke(&self, state: S, config: Option<RunnableConfig>) -> Result<S, AgentError> {
        let run_ctx = RunContext::new(config.unwrap_or_default());
        self.invoke_with_context(state, run_ctx).await
    }

    /// Runs the graph with a caller-built `RunContext` (e.g. one carrying a stream sender).
    pub async fn invoke_with_context(
        &self,
        state: S,
        run_ctx: RunContext<S>,
    ) -> Result<S, AgentError> {
        let mut state = state;
        self.run_loop(&mut state, &run_ctx).await?;
        Ok(state)
    }

    /// Streams graph execution: events arrive on the returned stream and the join handle
    /// resolves to the final state (or the error that stopped the run).
    pub fn stream(
        &self,
        state: S,
        config: Option<RunnableConfig>,
        stream_mode: impl Into<HashSet<StreamMode>>,
    ) -> StreamHandle<S> {
        let (tx, rx) = mpsc::channel(128);
        let graph = self.clone();
        let run_ctx = RunContext::new(config.unwrap_or_default()).with_stream(tx, stream_mode);

        let handle = tokio::spawn(async move { graph.invoke_with_context(state, run_ctx).await });

        (ReceiverStream::new(rx), handle)
    }

    fn entry_node(&self, config: &RunnableConfig) -> String {
        config
            .resume_from_node_id
            .as_ref()
            .filter(|id| self.nodes.contains_key(id.as_str()))
            .cloned()
            .unwrap_or_else(|| self.first_node_id.clone())
    }

    fn route(&self, current_id: &str, state: &S, next: Next) -> Option<String> {
        match self.next_map.get(current_id) {
            Some(NextEntry::Conditional(router)) => {
                let target = router.resolve_next(state);
                tracing::debug!(from = %current_id, to = %target, "conditional routing");
                Some(target)
            }
            entry => match next {
                Next::End => None,
                Next::Node(id) => Some(id),
                Next::Continue => match entry {
                    Some(NextEntry::Unconditional(id)) => Some(id.clone()),
                    _ => None,
                },
            },
        }
    }

    async fn save_checkpoint(
        &self,
        state: &S,
        step: i64,
        interrupt: Option<&Interrupt>,
        run_ctx: &RunContext<S>,
    ) -> Result<(), AgentError> {
        let (Some(cp), Some(thread_id)) = (&self.checkpointer, run_ctx.thread_id()) else {
            return Ok(());
        };
        let mut checkpoint = Checkpoint::from_state(state.clone(), CheckpointSource::Loop, step);
        if let Some(i) = interrupt {
            checkpoint = checkpoint.with_interrupt(i.clone());
        }
        cp.put(&run_ctx.config, &checkpoint)
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("checkpoint save failed: {e}")))?;
        tracing::debug!(thread_id, checkpoint_id = %checkpoint.id, step, "checkpoint saved");

        run_ctx
            .emit(StreamMode::Checkpoints, || {
                StreamEvent::Checkpoint(CheckpointEvent {
                    checkpoint_id: checkpoint.id.clone(),
                    thread_id: Some(thread_id.to_string()),
                    step,
                    interrupted: interrupt.is_some(),
                })
            })
            .await;
        Ok(())
    }

    async fn run_loop(&self, state: &mut S, run_ctx: &RunContext<S>) -> Result<(), AgentError> {
        let mut current_id = self.entry_node(&run_ctx.config);
        log_graph_start(run_ctx.thread_id(), &current_id);

        let mut step: i64 = 0;
        loop {
            let Some(node) = self.nodes.get(&current_id).cloned() else {
                let err = AgentError::ExecutionFailed(format!("unknown node: {current_id}"));
                log_graph_error(&err);
                return Err(err);
            };

            log_node_start(&current_id);
            let (new_state, next) = match node.run_with_context(state.clone(), run_ctx).await {
                Ok(output) => output,
                Err(AgentError::Interrupted(interrupt)) => {
                    self.save_checkpoint(state, step, Some(&interrupt.0), run_ctx)
                        .await?;
                    let err = AgentError::Interrupted(interrupt);
                    log_graph_error(&err);
                    return Err(err);
                }
                Err(e) => {
                    log_graph_error(&e);
                    return Err(e);
                }
            };
            step += 1;
            log_node_complete(&current_id, &next);
            *state = new_state;

            run_ctx
                .emit(StreamMode::Values, || StreamEvent::Values(state.clone()))
                .await;
            run_ctx
                .emit(StreamMode::Updates, || StreamEvent::Updates {
                    node_id: current_id.clone(),
                    state: state.clone(),
                })
                .await;

            match self.route(&current_id, state, next) {
                Some(id) if id != END => current_id = id,
                _ => {
                    self.save_checkpoint(state, step, None, run_ctx).await?;
                    log_graph_complete(step);
                    return Ok(());
                }
            }
        }
    }
}
