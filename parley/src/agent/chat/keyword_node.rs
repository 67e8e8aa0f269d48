//! Keyword-routed chatbot: searches when the user asks for it, otherwise asks the model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::AgentError;
use crate::graph::{Next, Node};
use crate::llm::LlmClient;
use crate::message::Message;
use crate::state::ChatState;
use crate::tools::{ToolRegistry, TOOL_TAVILY_SEARCH};

use super::chatbot_node::apply_chat_response;
use super::CHATBOT_NODE;

/// Words that route the last user message straight to web search.
pub const SEARCH_KEYWORDS: [&str; 2] = ["search", "lookup"];

/// Chatbot that decides on tool use itself instead of leaving it to the model.
///
/// When the last user message contains one of `SEARCH_KEYWORDS` (case-insensitive), the
/// whole message, lower-cased, is sent to `tavily_search` and the answer is appended as
/// the assistant reply. Otherwise the model is called without tools.
pub struct KeywordChatbotNode {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl KeywordChatbotNode {
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { llm, tools }
    }

    fn wants_search(lower: &str) -> bool {
        SEARCH_KEYWORDS.iter().any(|k| lower.contains(k))
    }
}

#[async_trait]
impl Node<ChatState> for KeywordChatbotNode {
    fn id(&self) -> &str {
        CHATBOT_NODE
    }

    async fn run(&self, mut state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let query = state
            .messages
            .last_user()
            .map(|m| m.content().to_lowercase())
            .filter(|q| Self::wants_search(q));

        if let Some(query) = query {
            tracing::debug!(%query, "keyword routing to search");
            let answer = match self
                .tools
                .call(TOOL_TAVILY_SEARCH, json!({ "query": query }), None)
                .await
            {
                Ok(content) => content.text,
                Err(e) => format!("Error: {e}"),
            };
            state.turn_count += 1;
            state.messages.push(Message::assistant(answer));
            return Ok((state, Next::End));
        }

        let response = self.llm.invoke(state.messages.as_slice()).await?;
        if response.tool_calls.len() == 1 {
            return Err(AgentError::ExecutionFailed(
                "model requested a tool call, but keyword routing has no tools step".into(),
            ));
        }
        let state = apply_chat_response(state, response)?;
        Ok((state, Next::End))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlm;
    use crate::state::ToolCall;
    use crate::tools::{
        TavilySearchTool, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec,
        MISSING_KEY_MESSAGE,
    };
    use serde_json::Value;

    fn node(llm: Arc<MockLlm>) -> KeywordChatbotNode {
        let tools = ToolRegistry::new().with(Box::new(TavilySearchTool::new(None)));
        KeywordChatbotNode::new(llm, Arc::new(tools))
    }

    fn with_user(text: &str) -> ChatState {
        let mut s = ChatState::new(None);
        s.messages.push(Message::user(text));
        s
    }

    struct RecordingSearch(Arc<std::sync::Mutex<Vec<Value>>>);

    #[async_trait]
    impl Tool for RecordingSearch {
        fn name(&self) -> &str {
            TOOL_TAVILY_SEARCH
        }
        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: TOOL_TAVILY_SEARCH.into(),
                description: None,
                input_schema: json!({}),
            }
        }
        async fn call(
            &self,
            args: Value,
            _ctx: Option<&ToolCallContext>,
        ) -> Result<ToolCallContent, ToolSourceError> {
            self.0.lock().unwrap().push(args);
            Ok(ToolCallContent {
                text: "found".into(),
            })
        }
    }

    #[test]
    fn wants_search_matches_keywords_anywhere() {
        assert!(KeywordChatbotNode::wants_search("please search for rust"));
        assert!(KeywordChatbotNode::wants_search("lookup the weather"));
        assert!(!KeywordChatbotNode::wants_search("hello there"));
    }

    #[tokio::test]
    async fn search_query_is_the_lower_cased_message() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let tools = ToolRegistry::new().with(Box::new(RecordingSearch(seen.clone())));
        let llm = Arc::new(MockLlm::with_no_tool_calls("unused"));
        let node = KeywordChatbotNode::new(llm, Arc::new(tools));

        let (state, _) = node.run(with_user("Please LOOKUP the Weather")).await.unwrap();
        assert_eq!(state.last_assistant_reply(), "found");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![json!({"query": "please lookup the weather"})]
        );
    }

    #[tokio::test]
    async fn keyword_message_goes_to_search_without_model() {
        let llm = Arc::new(MockLlm::with_no_tool_calls("unused"));
        let (state, next) = node(llm.clone()).run(with_user("Search rust")).await.unwrap();
        assert_eq!(next, Next::End);
        assert_eq!(state.messages.last(), Some(&Message::assistant(MISSING_KEY_MESSAGE)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn other_messages_go_to_model() {
        let llm = Arc::new(MockLlm::with_no_tool_calls("Hi there"));
        let (state, _) = node(llm.clone()).run(with_user("hello")).await.unwrap();
        assert_eq!(state.last_assistant_reply(), "Hi there");
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn missing_search_tool_is_reported_as_reply() {
        let llm = Arc::new(MockLlm::with_no_tool_calls("unused"));
        let node = KeywordChatbotNode::new(llm, Arc::new(ToolRegistry::new()));
        let (state, _) = node.run(with_user("lookup x")).await.unwrap();
        assert!(state.last_assistant_reply().starts_with("Error: tool not found"));
    }

    #[tokio::test]
    async fn model_tool_requests_are_rejected() {
        let one = Arc::new(MockLlm::new("", vec![ToolCall::new("a", "x", "{}")]));
        assert!(matches!(
            node(one).run(with_user("hi")).await,
            Err(AgentError::ExecutionFailed(_))
        ));
        let two = Arc::new(MockLlm::new(
            "",
            vec![ToolCall::new("a", "x", "{}"), ToolCall::new("b", "x", "{}")],
        ));
        assert!(matches!(
            node(two).run(with_user("hi")).await,
            Err(AgentError::MultipleToolCalls { count: 2 })
        ));
    }
}
