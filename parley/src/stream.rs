//! Streaming types for graph runs.
//!
//! `CompiledStateGraph::stream` and `RunContext::stream_tx` carry `StreamEvent`s; the
//! selected `StreamMode`s decide which kinds are emitted.

use std::fmt::Debug;

/// Stream mode selector: which kinds of events to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StreamMode {
    /// Emit full state after each node completes.
    Values,
    /// Emit the node id and state after each node.
    Updates,
    /// Emit an event whenever a checkpoint is written.
    Checkpoints,
}

/// Emitted when the run loop writes a checkpoint.
#[derive(Clone, Debug)]
pub struct CheckpointEvent {
    pub checkpoint_id: String,
    pub thread_id: Option<String>,
    pub step: i64,
    /// True when the checkpoint was written because a node interrupted.
    pub interrupted: bool,
}

/// Streamed event emitted while running a graph.
#[derive(Clone, Debug)]
pub enum StreamEvent<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    /// Full state snapshot after a node finishes.
    Values(S),
    /// Node id and state after that node.
    Updates { node_id: String, state: S },
    Checkpoint(CheckpointEvent),
}
