//! Errors from running or resuming chat turns.

use thiserror::Error;

use crate::error::AgentError;
use crate::graph::CompilationError;
use crate::memory::CheckpointError;

/// Error from `ChatRunner`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("graph compilation failed: {0}")]
    Compilation(#[from] CompilationError),
    #[error("checkpoint: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("{0}")]
    Execution(#[from] AgentError),
    /// A new turn was started while the thread waits on a human reply.
    #[error("thread is waiting for a human reply to tool call {tool_call_id}")]
    Suspended { tool_call_id: String },
    #[error("invalid resume: {0}")]
    InvalidResume(String),
    #[error("nothing to resume: thread is not suspended")]
    NothingToResume,
    #[error("turn task failed: {0}")]
    Join(String),
}

impl RunError {
    /// True when the session must stop (a model contract violation).
    pub fn is_fatal(&self) -> bool {
        matches!(self, RunError::Execution(e) if e.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contract_violations_are_fatal() {
        assert!(RunError::from(AgentError::MultipleToolCalls { count: 2 }).is_fatal());
        assert!(!RunError::from(AgentError::ExecutionFailed("x".into())).is_fatal());
        assert!(!RunError::NothingToResume.is_fatal());
        assert!(RunError::Suspended {
            tool_call_id: "c1".into()
        }
        .to_string()
        .contains("c1"));
    }
}
