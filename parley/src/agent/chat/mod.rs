//! Chat agent: a model that either replies or asks for one tool, plus the runner that
//! persists each thread and suspends turns waiting on a human.
//!
//! Model routing graph: `START → chatbot → (tools → chatbot)* → END`, where
//! `tools_condition` picks `tools` while a call is pending. Keyword routing graph:
//! `START → chatbot → END` with `KeywordChatbotNode`.

mod build;
mod chatbot_node;
mod config;
mod error;
mod keyword_node;
mod runner;
mod token;
mod tools_node;

pub use build::{build_chat_runner, BuildRunnerError};
pub use chatbot_node::ChatbotNode;
pub use config::{ChatBuildConfig, ChatOptions, RoutingMode};
pub use error::RunError;
pub use keyword_node::{KeywordChatbotNode, SEARCH_KEYWORDS};
pub use runner::{ChatRunner, TurnOutcome};
pub use token::{ContinuationToken, Suspension};
pub use tools_node::{HandleToolErrors, ToolsNode};

use crate::graph::END;
use crate::state::ChatState;

/// Node id of the chatbot step.
pub const CHATBOT_NODE: &str = "chatbot";
/// Node id of the tools step.
pub const TOOLS_NODE: &str = "tools";

/// Routing decision after the chatbot step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolsConditionResult {
    Tools,
    End,
}

impl ToolsConditionResult {
    /// Key used in the conditional path map.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolsConditionResult::Tools => TOOLS_NODE,
            ToolsConditionResult::End => END,
        }
    }
}

/// Routes to the tools step while a tool call is pending, otherwise ends the turn.
pub fn tools_condition(state: &ChatState) -> ToolsConditionResult {
    if state.pending_tool_call.is_some() {
        ToolsConditionResult::Tools
    } else {
        ToolsConditionResult::End
    }
}
