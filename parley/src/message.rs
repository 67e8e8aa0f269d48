//! Message types for the conversation log.
//!
//! Roles: System (usually first in the log), User, Assistant, Tool. Assistant messages may
//! carry the tool call the model asked for; tool messages carry the id of the call they answer.

use serde::{Deserialize, Serialize};

use crate::state::ToolCall;

/// Role of a message, for display and provider mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System prompt; typically placed first in the log.
    System { content: String },
    /// User input.
    User { content: String },
    /// Model reply, optionally requesting one tool call.
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_call: Option<ToolCall>,
    },
    /// Result of a tool call, matched by `tool_call_id`.
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::System {
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::User {
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_call: None,
        }
    }

    /// Assistant message that requests `tool_call`.
    pub fn assistant_with_tool_call(content: impl Into<String>, tool_call: ToolCall) -> Self {
        Self::Assistant {
            content: content.into(),
            tool_call: Some(tool_call),
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::System { .. } => Role::System,
            Message::User { .. } => Role::User,
            Message::Assistant { .. } => Role::Assistant,
            Message::Tool { .. } => Role::Tool,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::User { content }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool call requested by this message, if it is an assistant message with one.
    pub fn tool_call(&self) -> Option<&ToolCall> {
        match self {
            Message::Assistant { tool_call, .. } => tool_call.as_ref(),
            _ => None,
        }
    }
}
