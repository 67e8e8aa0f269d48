//! Agent execution error types.
//!
//! Returned by graph nodes and by `CompiledStateGraph::invoke`. Interrupts travel through
//! the same channel so the run loop can checkpoint and stop.

use thiserror::Error;

use crate::graph::GraphInterrupt;

/// Agent execution error.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Execution failed with a message (e.g. LLM call failed, tool error).
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// Graph execution was interrupted.
    ///
    /// Raised when a node needs human input. The graph executor saves a checkpoint
    /// of the pre-step state and returns this error; the caller resumes later.
    #[error("graph interrupted: {0}")]
    Interrupted(GraphInterrupt),

    /// The model asked for more than one tool call in a single step.
    ///
    /// This is a contract violation, not a recoverable error: the turn is aborted and
    /// nothing from the offending response is appended to the conversation.
    #[error("contract violation: model requested {count} tool calls in one step (at most one allowed)")]
    MultipleToolCalls { count: usize },
}

impl AgentError {
    /// True for errors that must abort the session rather than just the turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, AgentError::MultipleToolCalls { .. })
    }
}

impl From<GraphInterrupt> for AgentError {
    fn from(interrupt: GraphInterrupt) -> Self {
        AgentError::Interrupted(interrupt)
    }
}
