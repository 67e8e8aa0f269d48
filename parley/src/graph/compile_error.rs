//! Graph compilation error.

use thiserror::Error;

/// Error when compiling a state graph (unknown node, bad entry/exit, invalid chain).
#[derive(Debug, Error)]
pub enum CompilationError {
    /// A node id in an edge was not registered via `add_node` (and is not START/END).
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("graph must have exactly one edge from START")]
    MissingStart,

    /// No edge or conditional path can reach END.
    #[error("graph must have at least one path to END")]
    MissingEnd,

    /// Edges branch or loop where only a linear chain is allowed.
    #[error("edges must form a single linear chain from START to END: {0}")]
    InvalidChain(String),

    #[error("node has both edge and conditional edges: {0}")]
    NodeHasBothEdgeAndConditional(String),

    #[error("conditional path_map invalid target: {0}")]
    InvalidConditionalPathMap(String),
}
