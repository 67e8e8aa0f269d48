//! Mock LLM for tests and offline runs.
//!
//! Returns a fixed response, or plays back a script of responses in order. Every call
//! records the messages it was given so tests can assert on what the model saw.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::state::ToolCall;

/// Mock LLM: fixed or scripted responses.
///
/// In scripted mode each `invoke` pops the next response; once the script is exhausted
/// the call fails, so a test notices an unexpected extra model call.
///
/// **Interaction**: Implements `LlmClient`; used by the chat nodes in tests.
pub struct MockLlm {
    fixed: LlmResponse,
    script: Option<Mutex<VecDeque<LlmResponse>>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockLlm {
    /// Returns `content` and `tool_calls` on every call.
    pub fn new(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            fixed: LlmResponse::with_tool_calls(content, tool_calls),
            script: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns plain assistant text on every call.
    pub fn with_no_tool_calls(content: impl Into<String>) -> Self {
        Self::new(content, Vec::new())
    }

    /// Plays back `responses` in order, one per call.
    pub fn scripted(responses: Vec<LlmResponse>) -> Self {
        Self {
            fixed: LlmResponse::default(),
            script: Some(Mutex::new(responses.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// First call requests `tool_call`, second call answers with `final_answer`.
    pub fn first_tools_then_end(tool_call: ToolCall, final_answer: impl Into<String>) -> Self {
        Self::scripted(vec![
            LlmResponse::with_tool_calls("", vec![tool_call]),
            LlmResponse::text(final_answer),
        ])
    }

    /// Messages passed to each call so far, oldest call first.
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }
        match &self.script {
            None => Ok(self.fixed.clone()),
            Some(script) => script
                .lock()
                .map_err(|_| AgentError::ExecutionFailed("mock script lock poisoned".into()))?
                .pop_front()
                .ok_or_else(|| AgentError::ExecutionFailed("mock script exhausted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_mock_repeats_response_and_records_calls() {
        let llm = MockLlm::with_no_tool_calls("hello");
        let r1 = llm.invoke(&[Message::user("a")]).await.unwrap();
        let r2 = llm.invoke(&[Message::user("b")]).await.unwrap();
        assert_eq!(r1.content, "hello");
        assert_eq!(r2.content, "hello");
        assert!(r1.tool_calls.is_empty());
        assert_eq!(llm.call_count(), 2);
        assert_eq!(llm.calls()[1], vec![Message::user("b")]);
    }

    #[tokio::test]
    async fn first_tools_then_end_plays_script_then_fails() {
        let llm = MockLlm::first_tools_then_end(
            ToolCall::new("c1", "tavily_search", r#"{"query":"x"}"#),
            "done",
        );
        let first = llm.invoke(&[]).await.unwrap();
        assert_eq!(first.tool_calls.len(), 1);
        let second = llm.invoke(&[]).await.unwrap();
        assert_eq!(second.content, "done");
        assert!(second.tool_calls.is_empty());
        assert!(matches!(
            llm.invoke(&[]).await,
            Err(AgentError::ExecutionFailed(m)) if m.contains("exhausted")
        ));
    }
}
