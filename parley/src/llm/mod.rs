//! LLM client abstraction for the chatbot node.
//!
//! The chatbot node depends on a callable that returns assistant text and optional
//! tool calls; this module defines the trait, a Cohere implementation and a mock.

mod cohere;
mod mock;

pub use cohere::{CohereChat, DEFAULT_COHERE_BASE_URL, DEFAULT_COHERE_MODEL};
pub use mock::MockLlm;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::message::Message;
use crate::state::ToolCall;

/// Token usage for one LLM call (prompt + completion).
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LlmUsage {
    /// Tokens in the prompt (input).
    pub prompt_tokens: u32,
    /// Tokens in the completion (output).
    pub completion_tokens: u32,
    /// Total tokens (prompt + completion).
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Sums two usages field by field.
    pub fn add(&self, other: &LlmUsage) -> LlmUsage {
        LlmUsage {
            prompt_tokens: self.prompt_tokens.saturating_add(other.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(other.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(other.total_tokens),
        }
    }
}

/// Response from an LLM completion: assistant message text and requested tool calls.
///
/// **Interaction**: Returned by `LlmClient::invoke()`. The chatbot node rejects
/// responses with more than one entry in `tool_calls`.
#[derive(Clone, Debug, Default)]
pub struct LlmResponse {
    /// Assistant message content (plain text).
    pub content: String,
    /// Tool calls from this step; empty means the model answered directly.
    pub tool_calls: Vec<ToolCall>,
    /// Token usage for this call, when the provider reports it.
    pub usage: Option<LlmUsage>,
}

impl LlmResponse {
    /// Plain text answer without tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Response requesting the given tool calls.
    pub fn with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.into(),
            tool_calls,
            usage: None,
        }
    }
}

/// LLM client: given messages, returns assistant text and optional tool calls.
///
/// Implementations: `MockLlm` (scripted), `CohereChat` (Cohere v2 chat API). Tools the
/// model may call are bound to the client when it is built.
///
/// **Interaction**: Used by `ChatbotNode` and `KeywordChatbotNode`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Invokes one step: reads the full history, returns the assistant reply.
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_add_sums_fields() {
        let a = LlmUsage {
            prompt_tokens: 1,
            completion_tokens: 2,
            total_tokens: 3,
        };
        let b = LlmUsage {
            prompt_tokens: 10,
            completion_tokens: 20,
            total_tokens: 30,
        };
        assert_eq!(
            a.add(&b),
            LlmUsage {
                prompt_tokens: 11,
                completion_tokens: 22,
                total_tokens: 33
            }
        );
    }
}
