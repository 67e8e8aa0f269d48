//! Tools node: run the pending tool call and append its result as a tool message.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::AgentError;
use crate::graph::{GraphInterrupt, Interrupt, Next, Node, RunContext};
use crate::memory::RunnableConfig;
use crate::message::Message;
use crate::state::ChatState;
use crate::tools::{ToolCallContext, ToolRegistry, ToolSourceError};

use super::TOOLS_NODE;

/// What to do when a tool fails (other than by interrupting).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleToolErrors {
    /// Fail the turn with `AgentError::ExecutionFailed`.
    Never,
    /// Append the error as the tool result so the model can react. `Some(text)` replaces
    /// the default `Error: <error>` text.
    Always(Option<String>),
}

impl Default for HandleToolErrors {
    fn default() -> Self {
        HandleToolErrors::Always(None)
    }
}

/// Dispatches `ChatState::pending_tool_call` through the registry.
///
/// On success the result is appended as `Message::Tool` answering the call id, and
/// `pending_tool_call` / `resume` are cleared. A tool interrupt becomes
/// `AgentError::Interrupted` whose interrupt id is the tool-call id; the state is left
/// untouched so the step can be re-run with `resume` set.
pub struct ToolsNode {
    tools: Arc<ToolRegistry>,
    handle_tool_errors: HandleToolErrors,
}

impl ToolsNode {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self {
            tools,
            handle_tool_errors: HandleToolErrors::default(),
        }
    }

    pub fn with_handle_tool_errors(mut self, handle: HandleToolErrors) -> Self {
        self.handle_tool_errors = handle;
        self
    }
}

fn parse_arguments(raw: &str) -> Result<Value, ToolSourceError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| ToolSourceError::InvalidInput(e.to_string()))
}

#[async_trait]
impl Node<ChatState> for ToolsNode {
    fn id(&self) -> &str {
        TOOLS_NODE
    }

    async fn run(&self, state: ChatState) -> Result<(ChatState, Next), AgentError> {
        let ctx = RunContext::new(RunnableConfig::default());
        self.run_with_context(state, &ctx).await
    }

    async fn run_with_context(
        &self,
        mut state: ChatState,
        run_ctx: &RunContext<ChatState>,
    ) -> Result<(ChatState, Next), AgentError> {
        let Some(tc) = state.pending_tool_call.clone() else {
            return Ok((state, Next::Continue));
        };

        let call_ctx = ToolCallContext {
            thread_id: run_ctx.thread_id().map(String::from),
            tool_call_id: Some(tc.id.clone()),
            resume: state.resume.clone(),
        };
        tracing::debug!(tool = %tc.name, call_id = %tc.id, resumed = call_ctx.resume.is_some(), "calling tool");

        let result = match parse_arguments(&tc.arguments) {
            Ok(args) => self.tools.call(&tc.name, args, Some(&call_ctx)).await,
            Err(e) => Err(e),
        };
        let text = match result {
            Ok(content) => content.text,
            Err(ToolSourceError::Interrupted(value)) => {
                return Err(GraphInterrupt(Interrupt::with_id(value, tc.id)).into());
            }
            Err(e) => match &self.handle_tool_errors {
                HandleToolErrors::Never => {
                    return Err(AgentError::ExecutionFailed(format!(
                        "tool {} failed: {}",
                        tc.name, e
                    )));
                }
                HandleToolErrors::Always(custom) => {
                    tracing::warn!(tool = %tc.name, error = %e, "tool failed; reporting to model");
                    custom.clone().unwrap_or_else(|| format!("Error: {e}"))
                }
            },
        };

        state.messages.push(Message::tool(tc.id, text));
        state.pending_tool_call = None;
        state.resume = None;
        Ok((state, Next::Continue))
    }
}
