//! Interrupt mechanism for graph execution.
//!
//! A node returns `AgentError::Interrupted(GraphInterrupt(..))` to pause the run for
//! human input. The run loop checkpoints the state the node received, attaches the
//! interrupt to that checkpoint, and stops; the caller resumes later.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Interrupt value raised during graph execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrupt {
    /// Payload surfaced to the operator (any JSON).
    pub value: serde_json::Value,
    /// Identifies what the interrupt is waiting on (e.g. the pending tool call id).
    pub id: Option<String>,
}

impl Interrupt {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value, id: None }
    }

    pub fn with_id(value: serde_json::Value, id: impl Into<String>) -> Self {
        Self {
            value,
            id: Some(id.into()),
        }
    }
}

/// Error raised when a graph is interrupted.
#[derive(Debug, Clone, Error)]
#[error("graph interrupted: {0:?}")]
pub struct GraphInterrupt(pub Interrupt);

impl From<Interrupt> for GraphInterrupt {
    fn from(interrupt: Interrupt) -> Self {
        GraphInterrupt(interrupt)
    }
}
