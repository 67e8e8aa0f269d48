//! Chat runner: one thread, one turn at a time, persisted through a checkpointer.
//!
//! Each turn loads the latest checkpoint of the thread (or a fresh state), appends the user
//! message and runs the graph. When a tool interrupts, the graph has already saved the
//! pre-step state with the interrupt attached; the runner turns that into a `Suspension`.
//! `resume` validates the continuation token and the operator reply against that
//! checkpoint and re-enters the graph at the tools step.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio_stream::StreamExt;

use crate::error::AgentError;
use crate::graph::{CompiledStateGraph, StateGraph, END, START};
use crate::llm::LlmClient;
use crate::memory::{Checkpoint, Checkpointer, RunnableConfig};
use crate::message::Message;
use crate::state::{ChatState, MessageLog};
use crate::stream::{StreamEvent, StreamMode};
use crate::tools::ToolRegistry;

use super::token::query_text;
use super::{
    tools_condition, ChatOptions, ChatbotNode, ContinuationToken, KeywordChatbotNode, RoutingMode,
    RunError, Suspension, ToolsNode, CHATBOT_NODE, TOOLS_NODE,
};

/// Result of one turn.
#[derive(Debug, Clone)]
pub enum TurnOutcome {
    /// The model answered; `reply` is the last assistant message.
    Responded { reply: String, state: ChatState },
    /// The turn waits on a human; resume it with the token.
    Suspended(Suspension),
}

/// Runs chat turns for one thread.
///
/// Turns are strictly sequential: `run_turn` and `resume` take a per-runner lock for
/// their whole duration.
///
/// **Interaction**: Built by `build_chat_runner` (or `ChatRunner::new` with any
/// `LlmClient` / `Checkpointer`); driven by the CLI REPL.
pub struct ChatRunner {
    compiled: CompiledStateGraph<ChatState>,
    checkpointer: Arc<dyn Checkpointer<ChatState>>,
    thread_id: String,
    system_prompt: Option<String>,
    turn_lock: Mutex<()>,
}

fn build_graph(
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    options: &ChatOptions,
    checkpointer: Arc<dyn Checkpointer<ChatState>>,
) -> Result<CompiledStateGraph<ChatState>, RunError> {
    let mut graph = StateGraph::<ChatState>::new();
    match options.routing {
        RoutingMode::Model => {
            let tools_node = ToolsNode::new(tools)
                .with_handle_tool_errors(options.handle_tool_errors.clone());
            graph
                .add_node(CHATBOT_NODE, Arc::new(ChatbotNode::new(llm)))
                .add_node(TOOLS_NODE, Arc::new(tools_node))
                .add_edge(START, CHATBOT_NODE)
                .add_conditional_edges(
                    CHATBOT_NODE,
                    Arc::new(|s: &ChatState| tools_condition(s).as_str().to_string()),
                    Some(
                        [
                            (TOOLS_NODE.to_string(), TOOLS_NODE.to_string()),
                            (END.to_string(), END.to_string()),
                        ]
                        .into_iter()
                        .collect(),
                    ),
                )
                .add_edge(TOOLS_NODE, CHATBOT_NODE);
        }
        RoutingMode::Keyword => {
            graph
                .add_node(CHATBOT_NODE, Arc::new(KeywordChatbotNode::new(llm, tools)))
                .add_edge(START, CHATBOT_NODE)
                .add_edge(CHATBOT_NODE, END);
        }
    }
    Ok(graph.compile_with_checkpointer(checkpointer)?)
}

impl ChatRunner {
    /// Compiles the chat graph for `options.routing` over `tools` and `checkpointer`.
    ///
    /// In model routing, `llm` should already have the registry's tool specs bound
    /// (see `CohereChat::with_tools`).
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: ToolRegistry,
        checkpointer: Arc<dyn Checkpointer<ChatState>>,
        thread_id: impl Into<String>,
        options: ChatOptions,
    ) -> Result<Self, RunError> {
        let compiled = build_graph(llm, Arc::new(tools), &options, checkpointer.clone())?;
        Ok(Self {
            compiled,
            checkpointer,
            thread_id: thread_id.into(),
            system_prompt: options.system_prompt,
            turn_lock: Mutex::new(()),
        })
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    fn config(&self) -> RunnableConfig {
        RunnableConfig::for_thread(self.thread_id.clone())
    }

    async fn latest(&self) -> Result<Option<Checkpoint<ChatState>>, RunError> {
        let tuple = self.checkpointer.get_tuple(&self.config()).await?;
        Ok(tuple.map(|(cp, _)| cp))
    }

    fn suspension_from(&self, id: Option<String>, value: &Value) -> Suspension {
        Suspension {
            token: ContinuationToken {
                thread_id: self.thread_id.clone(),
                tool_call_id: id.unwrap_or_default(),
            },
            query: query_text(value),
        }
    }

    /// Runs one turn for `text`.
    pub async fn run_turn(&self, text: &str) -> Result<TurnOutcome, RunError> {
        self.stream_turn(text, |_| {}).await
    }

    /// Runs one turn, calling `on_event` with the state after each graph step as it
    /// completes (so each appended message can be shown as soon as it exists).
    pub async fn stream_turn<F>(&self, text: &str, on_event: F) -> Result<TurnOutcome, RunError>
    where
        F: FnMut(StreamEvent<ChatState>),
    {
        let _turn = self.turn_lock.lock().await;
        let mut state = match self.latest().await? {
            Some(cp) => {
                if let Some(interrupt) = cp.pending_interrupt {
                    return Err(RunError::Suspended {
                        tool_call_id: interrupt.id.unwrap_or_default(),
                    });
                }
                cp.channel_values
            }
            None => ChatState::new(self.system_prompt.as_deref()),
        };
        state.messages.push(Message::user(text));
        tracing::debug!(thread_id = %self.thread_id, history = state.messages.len(), "turn start");
        self.drive(state, self.config(), on_event).await
    }

    /// Resumes a suspended turn with the operator `reply`, which must carry a `data` field.
    pub async fn resume(
        &self,
        token: &ContinuationToken,
        reply: Value,
    ) -> Result<TurnOutcome, RunError> {
        self.stream_resume(token, reply, |_| {}).await
    }

    /// Streaming form of `resume`.
    pub async fn stream_resume<F>(
        &self,
        token: &ContinuationToken,
        reply: Value,
        on_event: F,
    ) -> Result<TurnOutcome, RunError>
    where
        F: FnMut(StreamEvent<ChatState>),
    {
        let _turn = self.turn_lock.lock().await;
        if token.thread_id != self.thread_id {
            return Err(RunError::InvalidResume(format!(
                "token is for thread {}, runner serves {}",
                token.thread_id, self.thread_id
            )));
        }
        let cp = self.latest().await?.ok_or(RunError::NothingToResume)?;
        let interrupt = cp.pending_interrupt.ok_or(RunError::NothingToResume)?;
        if interrupt.id.as_deref() != Some(token.tool_call_id.as_str()) {
            return Err(RunError::InvalidResume(format!(
                "token names tool call {}, thread waits on {}",
                token.tool_call_id,
                interrupt.id.unwrap_or_default()
            )));
        }
        let mut state = cp.channel_values;
        match &state.pending_tool_call {
            Some(tc) if tc.id == token.tool_call_id => {}
            _ => {
                return Err(RunError::InvalidResume(
                    "checkpoint has no matching pending tool call".into(),
                ))
            }
        }
        if reply.get("data").map_or(true, Value::is_null) {
            return Err(RunError::InvalidResume(
                "reply must be an object with a non-null data field".into(),
            ));
        }

        tracing::info!(thread_id = %self.thread_id, tool_call_id = %token.tool_call_id, "resuming turn");
        state.resume = Some(reply);
        let config = RunnableConfig {
            resume_from_node_id: Some(TOOLS_NODE.to_string()),
            ..self.config()
        };
        self.drive(state, config, on_event).await
    }

    async fn drive<F>(
        &self,
        state: ChatState,
        config: RunnableConfig,
        mut on_event: F,
    ) -> Result<TurnOutcome, RunError>
    where
        F: FnMut(StreamEvent<ChatState>),
    {
        let (mut events, handle) =
            self.compiled
                .stream(state, Some(config), HashSet::from([StreamMode::Updates]));
        while let Some(event) = events.next().await {
            on_event(event);
        }
        match handle.await.map_err(|e| RunError::Join(e.to_string()))? {
            Ok(state) => Ok(TurnOutcome::Responded {
                reply: state.last_assistant_reply().to_string(),
                state,
            }),
            Err(AgentError::Interrupted(interrupt)) => {
                let suspension = self.suspension_from(interrupt.0.id, &interrupt.0.value);
                tracing::info!(token = %suspension.token, "turn suspended");
                Ok(TurnOutcome::Suspended(suspension))
            }
            Err(e) => Err(RunError::Execution(e)),
        }
    }

    /// The suspension the thread waits on, if any. Read from the latest checkpoint, so it
    /// survives restarts when the checkpointer is persistent.
    pub async fn pending(&self) -> Result<Option<Suspension>, RunError> {
        Ok(self.latest().await?.and_then(|cp| {
            cp.pending_interrupt
                .map(|i| self.suspension_from(i.id, &i.value))
        }))
    }

    /// Persisted message log of the thread (empty for a new thread).
    pub async fn history(&self) -> Result<MessageLog, RunError> {
        Ok(self
            .latest()
            .await?
            .map(|cp| cp.channel_values.messages)
            .unwrap_or_default())
    }
}
