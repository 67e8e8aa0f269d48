//! Human assistance tool (`human_assistance`): asks an operator and waits for the reply.
//!
//! The first call for a tool-call id has no resume value and interrupts with
//! `{"query": <query>}`. When the turn is resumed the tools node re-runs the call with
//! the operator reply in `ToolCallContext::resume`; the reply's `data` field becomes the
//! tool result. There is no timeout: a suspended turn waits until it is resumed.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::tools::{required_str, Tool, ToolCallContent, ToolCallContext, ToolSourceError, ToolSpec};

pub const TOOL_HUMAN_ASSISTANCE: &str = "human_assistance";

#[derive(Debug, Default)]
pub struct HumanAssistanceTool;

impl HumanAssistanceTool {
    pub fn new() -> Self {
        Self
    }
}

/// Text of an operator reply's `data` field: strings verbatim, other JSON compact.
/// A null `data` counts as missing.
pub(crate) fn reply_data_text(reply: &Value) -> Option<String> {
    reply.get("data").filter(|d| !d.is_null()).map(|data| match data {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[async_trait]
impl Tool for HumanAssistanceTool {
    fn name(&self) -> &str {
        TOOL_HUMAN_ASSISTANCE
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_HUMAN_ASSISTANCE.to_string(),
            description: Some("Request assistance from a human.".to_string()),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string", "description": "What to ask the human."}
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(
        &self,
        args: Value,
        ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolSourceError> {
        let query = required_str(&args, "query")?;
        match ctx.and_then(|c| c.resume.as_ref()) {
            None => {
                tracing::info!(query, "human assistance requested");
                Err(ToolSourceError::Interrupted(json!({ "query": query })))
            }
            Some(reply) => {
                let text = reply_data_text(reply).ok_or_else(|| {
                    ToolSourceError::InvalidInput("operator reply has no data field".into())
                })?;
                Ok(ToolCallContent { text })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resumed(reply: Value) -> ToolCallContext {
        ToolCallContext {
            resume: Some(reply),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_call_interrupts_with_query() {
        let tool = HumanAssistanceTool::new();
        let err = tool
            .call(json!({"query": "Is this right?"}), None)
            .await
            .unwrap_err();
        match err {
            ToolSourceError::Interrupted(v) => assert_eq!(v, json!({"query": "Is this right?"})),
            other => panic!("expected Interrupted, got {other:?}"),
        }

        let no_resume = ToolCallContext::default();
        assert!(matches!(
            tool.call(json!({"query": "q"}), Some(&no_resume)).await,
            Err(ToolSourceError::Interrupted(_))
        ));
    }

    #[tokio::test]
    async fn resume_returns_data_field_exactly() {
        let tool = HumanAssistanceTool::new();
        let ctx = resumed(json!({"data": "Y"}));
        let out = tool.call(json!({"query": "q"}), Some(&ctx)).await.unwrap();
        assert_eq!(out.text, "Y");

        let ctx = resumed(json!({"data": {"approved": true}}));
        let out = tool.call(json!({"query": "q"}), Some(&ctx)).await.unwrap();
        assert_eq!(out.text, r#"{"approved":true}"#);
    }

    #[tokio::test]
    async fn resume_without_data_is_invalid_input() {
        let tool = HumanAssistanceTool::new();
        for reply in [json!({"answer": "Y"}), json!({"data": null})] {
            let ctx = resumed(reply);
            assert!(matches!(
                tool.call(json!({"query": "q"}), Some(&ctx)).await,
                Err(ToolSourceError::InvalidInput(_))
            ));
        }
    }
}
