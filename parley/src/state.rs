//! Chat state: append-only message log plus the bookkeeping for one pending tool call.
//!
//! `ChatState` is the state type `S` of the chat graph. Nodes take it by value and return
//! it with new messages pushed; the log itself has no API for removing or editing entries.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::LlmUsage;
use crate::message::Message;

/// One tool invocation requested by the model.
///
/// `arguments` is the raw JSON text from the provider; the tools node parses it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Ordered, append-only list of messages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageLog(Vec<Message>);

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.0
    }

    /// Most recent user message, if any.
    pub fn last_user(&self) -> Option<&Message> {
        self.0
            .iter()
            .rev()
            .find(|m| matches!(m, Message::User { .. }))
    }
}

impl FromIterator<Message> for MessageLog {
    fn from_iter<I: IntoIterator<Item = Message>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// State of one chat thread.
///
/// - `pending_tool_call`: set by the chatbot node when the model asked for a tool; cleared
///   by the tools node once a result is appended.
/// - `resume`: operator reply being fed back into a suspended human-assistance call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatState {
    pub messages: MessageLog,
    #[serde(default)]
    pub pending_tool_call: Option<ToolCall>,
    #[serde(default)]
    pub resume: Option<Value>,
    #[serde(default)]
    pub turn_count: u32,
    #[serde(default)]
    pub total_usage: Option<LlmUsage>,
}

impl ChatState {
    /// Fresh state, optionally seeded with a system prompt.
    pub fn new(system_prompt: Option<&str>) -> Self {
        let mut messages = MessageLog::new();
        if let Some(p) = system_prompt {
            messages.push(Message::system(p));
        }
        Self {
            messages,
            ..Self::default()
        }
    }

    /// Content of the last assistant message, or empty when there is none.
    pub fn last_assistant_reply(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| matches!(m, Message::Assistant { .. }))
            .map(Message::content)
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_log_preserves_append_order() {
        let mut log = MessageLog::new();
        log.push(Message::user("1"));
        log.push(Message::assistant("2"));
        log.push(Message::user("3"));
        let contents: Vec<&str> = log.iter().map(Message::content).collect();
        assert_eq!(contents, vec!["1", "2", "3"]);
        assert_eq!(log.last_user().map(Message::content), Some("3"));
    }

    #[test]
    fn chat_state_new_seeds_system_prompt() {
        let s = ChatState::new(Some("be brief"));
        assert_eq!(s.messages.len(), 1);
        assert!(matches!(s.messages.last(), Some(Message::System { .. })));
        assert!(ChatState::new(None).messages.is_empty());
    }

    #[test]
    fn last_assistant_reply_skips_tool_messages() {
        let mut s = ChatState::new(None);
        s.messages.push(Message::user("q"));
        s.messages.push(Message::assistant("answer"));
        s.messages.push(Message::tool("c1", "tool out"));
        assert_eq!(s.last_assistant_reply(), "answer");
    }

    #[test]
    fn chat_state_json_roundtrip_keeps_log() {
        let mut s = ChatState::new(Some("sys"));
        s.messages.push(Message::user("hi"));
        s.pending_tool_call = Some(ToolCall::new("c1", "human_assistance", "{}"));
        let json = serde_json::to_string(&s).unwrap();
        let back: ChatState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.messages, s.messages);
        assert_eq!(back.pending_tool_call, s.pending_tool_call);
    }
}
