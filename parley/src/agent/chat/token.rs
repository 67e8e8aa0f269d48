//! Continuation token and suspension returned when a turn waits on a human.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies a suspended turn: the thread and the pending tool call.
///
/// Serializable so a caller can hand it across processes; `ChatRunner::resume` checks it
/// against the latest checkpoint of the thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken {
    pub thread_id: String,
    pub tool_call_id: String,
}

impl fmt::Display for ContinuationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.thread_id, self.tool_call_id)
    }
}

/// A turn paused on `human_assistance`: what to answer and how to resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suspension {
    pub token: ContinuationToken,
    /// Question surfaced to the operator.
    pub query: String,
}

/// Operator-facing text of an interrupt payload: its `query` string, else the JSON.
pub(crate) fn query_text(value: &Value) -> String {
    match value.get("query").and_then(Value::as_str) {
        Some(q) => q.to_string(),
        None => value.to_string(),
    }
}
