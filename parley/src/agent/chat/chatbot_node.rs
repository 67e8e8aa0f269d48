//! Chatbot node: send the history to the model, append its reply or its one tool request.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::{LlmClient, LlmResponse};
use crate::message::Message;
use crate::state::ChatState;

use super::CHATBOT_NODE;

pub struct ChatbotNode {
    llm: Arc<dyn LlmClient>,
}

impl ChatbotNode {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }
}

/// Applies one model response to the state.
///
/// More than one tool call is rejected before anything is written. A single call gets a
/// fresh id when the provider sent none, and is recorded both on the assistant message
/// and as the pending call.
pub(crate) fn apply_chat_response(
    mut state: ChatState,
    response: LlmResponse,
) -> Result<ChatState, AgentError> {
    let count = response.tool_calls.len();
    if count > 1 {
        tracing::error!(count, "model requested more than one tool call in one step");
        return Err(AgentError::MultipleToolCalls { count });
    }

    state.turn_count += 1;
    if let Some(u) = &response.usage {
        state.total_usage = Some(match &state.total_usage {
            Some(total) => total.add(u),
            None => u.clone(),
        });
    }

    match response.tool_calls.into_iter().next() {
        Some(mut tc) => {
            if tc.id.is_empty() {
                tc.id = uuid::Uuid::new_v4().to_string();
            }
            tracing::debug!(tool = %tc.name, call_id = %tc.id, "model requested tool");
            state
                .messages
                .push(Message::assistant_with_tool_call(response.content, tc.clone()));
            state.pending_tool_call = Some(tc);
        }
        None => state.messages.push(Message::assistant(response.content)),
    }
    Ok(state)
}

#[async_trait]
impl Node<ChatState> for ChatbotNode {
    fn id(&self) -> &str {
        CHATBOT_NODE
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let response = self.llm.invoke(state.messages.as_slice()).await?;
        let state = apply_chat_response(state, response)?;
        Ok((state, Next::Continue))
    }
}
