//! Cohere v2 Chat client implementing `LlmClient` (CohereChat).
//!
//! Talks to `POST {base}/v2/chat` with plain `reqwest` JSON. Optional tools are sent as
//! function tools; when present the API may answer with `tool_calls` instead of text.
//!
//! Request message mapping:
//! - system / user: `{"role", "content"}`
//! - assistant with a tool call: `{"role": "assistant", "tool_plan", "tool_calls": [..]}`
//! - tool: `{"role": "tool", "tool_call_id", "content"}`

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, trace};

use crate::error::AgentError;
use crate::llm::{LlmClient, LlmResponse, LlmUsage};
use crate::message::Message;
use crate::state::ToolCall;
use crate::tools::ToolSpec;

pub const DEFAULT_COHERE_BASE_URL: &str = "https://api.cohere.com";
pub const DEFAULT_COHERE_MODEL: &str = "command-r-plus-08-2024";

/// Cohere chat client.
///
/// **Interaction**: Implements `LlmClient`; used by the chat nodes like `MockLlm`.
pub struct CohereChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    tools: Vec<ToolSpec>,
}

impl CohereChat {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_COHERE_BASE_URL.to_string(),
            tools: Vec::new(),
        }
    }

    /// Overrides the API base URL (no trailing `/v2/chat`).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Tools the model may call.
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/v2/chat", self.base_url)
    }

    fn message_to_request(message: &Message) -> Value {
        match message {
            Message::System { content } => json!({"role": "system", "content": content}),
            Message::User { content } => json!({"role": "user", "content": content}),
            Message::Assistant {
                content,
                tool_call: Some(tc),
            } => {
                let mut m = json!({
                    "role": "assistant",
                    "tool_calls": [{
                        "id": tc.id,
                        "type": "function",
                        "function": {"name": tc.name, "arguments": tc.arguments},
                    }],
                });
                if !content.is_empty() {
                    m["tool_plan"] = json!(content);
                }
                m
            }
            Message::Assistant {
                content,
                tool_call: None,
            } => json!({"role": "assistant", "content": content}),
            Message::Tool {
                tool_call_id,
                content,
            } => json!({"role": "tool", "tool_call_id": tool_call_id, "content": content}),
        }
    }

    fn build_body(&self, messages: &[Message]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(Self::message_to_request).collect::<Vec<_>>(),
        });
        if !self.tools.is_empty() {
            body["tools"] = self
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description.clone().unwrap_or_default(),
                            "parameters": t.input_schema,
                        },
                    })
                })
                .collect();
        }
        body
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    usage: Option<ResponseUsage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    tool_plan: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseToolCall {
    #[serde(default)]
    id: Option<String>,
    function: ResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseUsage {
    #[serde(default)]
    billed_units: Option<TokenCounts>,
    #[serde(default)]
    tokens: Option<TokenCounts>,
}

#[derive(Debug, Deserialize)]
struct TokenCounts {
    #[serde(default)]
    input_tokens: Option<f64>,
    #[serde(default)]
    output_tokens: Option<f64>,
}

impl ResponseUsage {
    fn to_usage(&self) -> Option<LlmUsage> {
        let counts = self.tokens.as_ref().or(self.billed_units.as_ref())?;
        let prompt = counts.input_tokens.unwrap_or(0.0) as u32;
        let completion = counts.output_tokens.unwrap_or(0.0) as u32;
        Some(LlmUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt.saturating_add(completion),
        })
    }
}

impl From<ChatResponse> for LlmResponse {
    fn from(resp: ChatResponse) -> Self {
        let text: String = resp
            .message
            .content
            .iter()
            .filter_map(|b| b.text.as_deref())
            .collect();
        let tool_calls: Vec<ToolCall> = resp
            .message
            .tool_calls
            .into_iter()
            .map(|tc| {
                ToolCall::new(
                    tc.id.unwrap_or_default(),
                    tc.function.name,
                    tc.function.arguments.unwrap_or_else(|| "{}".to_string()),
                )
            })
            .collect();
        let content = if text.is_empty() && !tool_calls.is_empty() {
            resp.message.tool_plan.unwrap_or_default()
        } else {
            text
        };
        LlmResponse {
            content,
            tool_calls,
            usage: resp.usage.as_ref().and_then(ResponseUsage::to_usage),
        }
    }
}

#[async_trait]
impl LlmClient for CohereChat {
    async fn invoke(&self, messages: &[Message]) -> Result<LlmResponse, AgentError> {
        let body = self.build_body(messages);
        debug!(
            model = %self.model,
            message_count = messages.len(),
            tools = self.tools.len(),
            "cohere chat request"
        );
        trace!(body = %body, "cohere chat request body");

        let res = self
            .client
            .post(self.chat_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("cohere request failed: {e}")))?;

        let status = res.status();
        if !status.is_success() {
            let err_body = res.text().await.unwrap_or_default();
            return Err(AgentError::ExecutionFailed(format!(
                "cohere API error {}: {}",
                status.as_u16(),
                err_body
            )));
        }

        let parsed: ChatResponse = res
            .json()
            .await
            .map_err(|e| AgentError::ExecutionFailed(format!("cohere response decode: {e}")))?;
        let response = LlmResponse::from(parsed);
        debug!(
            tool_calls = response.tool_calls.len(),
            content_len = response.content.len(),
            "cohere chat response"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_http::{closed_port_url, serve_once};

    fn search_spec() -> ToolSpec {
        ToolSpec {
            name: "tavily_search".into(),
            description: Some("Search the web.".into()),
            input_schema: json!({"type": "object", "properties": {"query": {"type": "string"}}}),
        }
    }

    #[test]
    fn build_body_maps_roles_and_tools() {
        let chat = CohereChat::new("k", "m").with_tools(vec![search_spec()]);
        let tc = ToolCall::new("c1", "tavily_search", r#"{"query":"rust"}"#);
        let body = chat.build_body(&[
            Message::system("sys"),
            Message::user("hi"),
            Message::assistant_with_tool_call("let me look", tc),
            Message::tool("c1", "result"),
            Message::assistant("answer"),
        ]);
        let msgs = body["messages"].as_array().unwrap();
        assert_eq!(msgs[0], json!({"role": "system", "content": "sys"}));
        assert_eq!(msgs[1]["role"], "user");
        assert_eq!(msgs[2]["tool_plan"], "let me look");
        assert_eq!(msgs[2]["tool_calls"][0]["function"]["name"], "tavily_search");
        assert!(msgs[2].get("content").is_none());
        assert_eq!(msgs[3], json!({"role": "tool", "tool_call_id": "c1", "content": "result"}));
        assert_eq!(msgs[4]["content"], "answer");
        assert_eq!(body["model"], "m");
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["function"]["name"], "tavily_search");
    }

    #[test]
    fn build_body_omits_tools_when_none_bound() {
        let body = CohereChat::new("k", "m").build_body(&[Message::user("hi")]);
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn invoke_parses_text_and_usage() {
        let (url, server) = serve_once(
            "200 OK",
            json!({
                "id": "r1",
                "finish_reason": "COMPLETE",
                "message": {"role": "assistant", "content": [{"type": "text", "text": "Hello there"}]},
                "usage": {"billed_units": {"input_tokens": 5, "output_tokens": 2},
                          "tokens": {"input_tokens": 7.0, "output_tokens": 3.0}}
            })
            .to_string(),
        )
        .await;
        let chat = CohereChat::new("secret", "command-r").with_base_url(url);
        let resp = chat.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(resp.content, "Hello there");
        assert!(resp.tool_calls.is_empty());
        assert_eq!(
            resp.usage,
            Some(LlmUsage {
                prompt_tokens: 7,
                completion_tokens: 3,
                total_tokens: 10
            })
        );

        let req = server.await.unwrap();
        assert!(req.head.starts_with("POST /v2/chat"));
        assert_eq!(req.header("authorization").as_deref(), Some("Bearer secret"));
        assert_eq!(req.json()["messages"][0]["content"], "hi");
    }

    #[tokio::test]
    async fn invoke_parses_tool_calls() {
        let (url, _server) = serve_once(
            "200 OK",
            json!({
                "finish_reason": "TOOL_CALL",
                "message": {
                    "role": "assistant",
                    "tool_plan": "I will search.",
                    "tool_calls": [
                        {"id": "t1", "type": "function",
                         "function": {"name": "tavily_search", "arguments": "{\"query\":\"rust\"}"}},
                        {"id": "t2", "type": "function",
                         "function": {"name": "human_assistance", "arguments": "{\"query\":\"?\"}"}}
                    ]
                }
            })
            .to_string(),
        )
        .await;
        let chat = CohereChat::new("k", "m").with_base_url(url);
        let resp = chat.invoke(&[Message::user("hi")]).await.unwrap();
        assert_eq!(resp.content, "I will search.");
        assert_eq!(resp.tool_calls.len(), 2);
        assert_eq!(resp.tool_calls[0], ToolCall::new("t1", "tavily_search", r#"{"query":"rust"}"#));
        assert!(resp.usage.is_none());
    }

    #[tokio::test]
    async fn invoke_non_success_status_is_execution_failed() {
        let (url, _server) =
            serve_once("401 Unauthorized", r#"{"message":"invalid api token"}"#).await;
        let chat = CohereChat::new("bad", "m").with_base_url(url);
        match chat.invoke(&[Message::user("hi")]).await {
            Err(AgentError::ExecutionFailed(msg)) => {
                assert!(msg.contains("401"), "{}", msg);
                assert!(msg.contains("invalid api token"), "{}", msg);
            }
            other => panic!("expected ExecutionFailed, got {:?}", other.map(|r| r.content)),
        }
    }

    #[tokio::test]
    async fn invoke_with_unreachable_base_returns_error() {
        let chat = CohereChat::new("k", "m").with_base_url(closed_port_url().await);
        assert!(matches!(
            chat.invoke(&[Message::user("hi")]).await,
            Err(AgentError::ExecutionFailed(_))
        ));
    }
}
