//! Tools the model can call, and the registry the tools node dispatches through.
//!
//! - `TavilySearchTool` (`tavily_search`): web search; degraded results come back as
//!   text, never as errors.
//! - `HumanAssistanceTool` (`human_assistance`): pauses the turn until an operator replies.

mod human_assistance;
mod registry;
mod tavily;
mod r#trait;

pub use human_assistance::{HumanAssistanceTool, TOOL_HUMAN_ASSISTANCE};
pub use r#trait::Tool;
pub use registry::ToolRegistry;
pub use tavily::{
    TavilySearchTool, DEFAULT_TAVILY_SEARCH_URL, MISSING_KEY_MESSAGE, NO_ANSWER_MESSAGE,
    TOOL_TAVILY_SEARCH,
};

use serde_json::Value;
use thiserror::Error;

/// Tool description sent to the model: name, description and JSON Schema for arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    /// Human-readable description for the model.
    pub description: Option<String>,
    /// JSON Schema for arguments.
    pub input_schema: Value,
}

/// Result of a single tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallContent {
    pub text: String,
}

/// Per-call context handed to a tool by the tools node.
///
/// `resume` carries the operator reply when a suspended call is being re-run.
#[derive(Debug, Clone, Default)]
pub struct ToolCallContext {
    pub thread_id: Option<String>,
    pub tool_call_id: Option<String>,
    pub resume: Option<Value>,
}

/// Errors from calling tools.
///
/// **Interaction**: `Interrupted` is turned into a graph interrupt by the tools node;
/// the other variants are reported back to the model as an error tool message. The
/// search tool folds its own `Transport` failures into result text.
#[derive(Debug, Error)]
pub enum ToolSourceError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("invalid arguments: {0}")]
    InvalidInput(String),
    #[error("transport error: {0}")]
    Transport(String),
    /// The tool needs human input; the payload is surfaced to the operator.
    #[error("interrupted: {0}")]
    Interrupted(Value),
}

/// Reads a required string argument.
pub(crate) fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolSourceError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolSourceError::InvalidInput(format!("missing {key}")))
}
