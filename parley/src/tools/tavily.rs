//! Tavily web search tool (`tavily_search`).
//!
//! Asks Tavily for a direct answer to the query. Every failure is folded into the
//! returned text so the model always gets something to read:
//!
//! | situation                     | result                                       |
//! |-------------------------------|----------------------------------------------|
//! | no API key                    | `Tavily API key not found in environment.`   |
//! | 200 with `answer`             | the answer                                   |
//! | 200 without `answer` / null   | `No answer found.`                           |
//! | non-200                       | `Tavily API error: <status code>`            |
//! | transport / unreadable body   | `Tavily API error: <reason>`                 |

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_TAVILY_SEARCH: &str = "tavily_search";
pub const DEFAULT_TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";
pub const MISSING_KEY_MESSAGE: &str = "Tavily API key not found in environment.";
pub const NO_ANSWER_MESSAGE: &str = "No answer found.";

fn tavily_search_url() -> String {
    std::env::var("TAVILY_SEARCH_URL").unwrap_or_else(|_| DEFAULT_TAVILY_SEARCH_URL.to_string())
}

/// Web search via the Tavily API.
///
/// **Interaction**: Registered in the `ToolRegistry`; dispatched by `ToolsNode` in model
/// routing and by `KeywordChatbotNode` in keyword routing.
pub struct TavilySearchTool {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl TavilySearchTool {
    /// Tool with an explicit key (or none). Endpoint from `TAVILY_SEARCH_URL` or the default.
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: tavily_search_url(),
        }
    }

    /// Tool keyed from `TAVILY_API_KEY`. A missing key is not an error here: searches
    /// then answer with the missing-key message.
    pub fn from_env() -> Self {
        Self::new(std::env::var("TAVILY_API_KEY").ok())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Runs one search and returns the answer text (or the failure text).
    pub async fn search(&self, query: &str) -> String {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::warn!("tavily search skipped: no api key");
            return MISSING_KEY_MESSAGE.to_string();
        };
        match self.fetch_answer(api_key, query).await {
            Ok(Some(answer)) => answer,
            Ok(None) => NO_ANSWER_MESSAGE.to_string(),
            Err(ToolSourceError::Transport(reason)) => format!("Tavily API error: {reason}"),
            Err(e) => format!("Tavily API error: {e}"),
        }
    }

    /// One request to the search endpoint. `Ok(None)` when the response carries no
    /// answer; `Transport` for a failed request, a non-200 status (the code) or an
    /// unreadable body.
    async fn fetch_answer(
        &self,
        api_key: &str,
        query: &str,
    ) -> Result<Option<String>, ToolSourceError> {
        tracing::debug!(query, endpoint = %self.endpoint, "tavily search");
        let body = json!({
            "query": query,
            "search_depth": "basic",
            "include_answer": true,
        });
        let res = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "tavily request failed");
                ToolSourceError::Transport(e.to_string())
            })?;

        let status = res.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(status = status.as_u16(), "tavily returned non-200");
            return Err(ToolSourceError::Transport(status.as_u16().to_string()));
        }

        let v = res.json::<Value>().await.map_err(|e| {
            tracing::warn!(error = %e, "tavily response unreadable");
            ToolSourceError::Transport(e.to_string())
        })?;
        Ok(v.get("answer").and_then(Value::as_str).map(String::from))
    }
}

#[async_trait]
impl Tool for TavilySearchTool {
    fn name(&self) -> &str {
        TOOL_TAVILY_SEARCH
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_TAVILY_SEARCH.to_string(),
            description: Some(
                "Search the web for current information. Returns a short direct answer."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "The search query."}
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let query = required_str(&args, "query")?;
        Ok(ToolCallContent {
            text: self.search(query).await,
        })
    }
}
