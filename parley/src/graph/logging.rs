//! Structured logging for graph execution events.

use crate::error::AgentError;
use crate::graph::Next;

pub fn log_node_start(node_id: &str) {
    tracing::debug!(node_id = node_id, "Starting node execution");
}

pub fn log_node_complete(node_id: &str, next: &Next) {
    tracing::debug!(node_id = node_id, ?next, "Node execution complete");
}

pub fn log_graph_start(thread_id: Option<&str>, entry: &str) {
    tracing::info!(thread_id = ?thread_id, entry = entry, "Starting graph execution");
}

pub fn log_graph_complete(steps: i64) {
    tracing::info!(steps = steps, "Graph execution complete");
}

/// Interrupts are expected control flow and logged at info; everything else is an error.
pub fn log_graph_error(error: &AgentError) {
    match error {
        AgentError::Interrupted(i) => {
            tracing::info!(interrupt_id = ?i.0.id, "Graph execution interrupted")
        }
        e => tracing::error!(error = %e, "Graph execution error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_functions_do_not_panic() {
        log_node_start("n");
        log_node_complete("n", &Next::End);
        log_graph_start(Some("t"), "n");
        log_graph_complete(1);
        log_graph_error(&AgentError::ExecutionFailed("test".to_string()));
    }
}
