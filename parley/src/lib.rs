//! # Parley
//!
//! A small chat agent built on a state graph: a language model answers the user directly or
//! asks for one tool per step (web search or human assistance), and the whole conversation is
//! persisted per thread so turns can be suspended and resumed.
//!
//! ## Main modules
//!
//! - [`graph`]: [`StateGraph`], [`CompiledStateGraph`], [`Node`], [`Next`], [`RunContext`],
//!   [`Interrupt`]: build and run state graphs, pause on interrupts.
//! - [`memory`]: [`Checkpointer`], [`MemorySaver`], [`SqliteSaver`], [`RunnableConfig`]:
//!   session memory keyed by thread id.
//! - [`llm`]: [`LlmClient`] trait, [`CohereChat`], [`MockLlm`].
//! - [`tools`]: [`Tool`] trait, [`ToolRegistry`], [`TavilySearchTool`], [`HumanAssistanceTool`].
//! - [`agent::chat`]: chatbot and tools nodes, [`ChatRunner`] with suspend/resume.
//! - [`state`], [`message`]: [`ChatState`], [`MessageLog`], [`Message`], [`ToolCall`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parley::{ChatOptions, ChatRunner, ChatState, MemorySaver, MockLlm, ToolRegistry, TurnOutcome};
//!
//! # async fn run() -> Result<(), parley::RunError> {
//! let llm = Arc::new(MockLlm::with_no_tool_calls("Hello!"));
//! let runner = ChatRunner::new(
//!     llm,
//!     ToolRegistry::new(),
//!     Arc::new(MemorySaver::<ChatState>::new()),
//!     "thread-1",
//!     ChatOptions::default(),
//! )?;
//! if let TurnOutcome::Responded { reply, .. } = runner.run_turn("hi").await? {
//!     println!("{reply}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod graph;
pub mod llm;
pub mod memory;
pub mod message;
pub mod state;
pub mod stream;
pub mod tools;

pub use agent::chat::{
    build_chat_runner, tools_condition, BuildRunnerError, ChatBuildConfig, ChatOptions,
    ChatRunner, ChatbotNode, ContinuationToken, HandleToolErrors, KeywordChatbotNode,
    RoutingMode, RunError, Suspension, ToolsConditionResult, ToolsNode, TurnOutcome,
};
pub use error::AgentError;
pub use graph::{
    CompilationError, CompiledStateGraph, GraphInterrupt, Interrupt, Next, Node, RunContext,
    StateGraph, END, START,
};
pub use llm::{CohereChat, LlmClient, LlmResponse, LlmUsage, MockLlm};
pub use memory::{
    Checkpoint, CheckpointError, CheckpointMetadata, CheckpointSource, Checkpointer,
    JsonSerializer, MemorySaver, RunnableConfig, SqliteSaver,
};
pub use message::{Message, Role};
pub use state::{ChatState, MessageLog, ToolCall};
pub use stream::{StreamEvent, StreamMode};
pub use tools::{
    HumanAssistanceTool, TavilySearchTool, Tool, ToolCallContent, ToolCallContext,
    ToolRegistry, ToolSourceError, ToolSpec,
};

#[cfg(test)]
mod test_http;
