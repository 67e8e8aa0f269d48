//! Builds a `ChatRunner` from `ChatBuildConfig`: Cohere client, the two tools and the
//! checkpointer (SQLite when a db path is set, in-memory otherwise).

use std::sync::Arc;

use thiserror::Error;

use crate::llm::CohereChat;
use crate::memory::{CheckpointError, Checkpointer, JsonSerializer, MemorySaver, SqliteSaver};
use crate::state::ChatState;
use crate::tools::{HumanAssistanceTool, TavilySearchTool, ToolRegistry};

use super::{ChatBuildConfig, ChatRunner, RoutingMode, RunError};

#[derive(Debug, Error)]
pub enum BuildRunnerError {
    #[error("COHERE_API_KEY is not set")]
    MissingCohereKey,
    #[error("PARLEY_ROUTING: {0}")]
    InvalidRouting(String),
    #[error("checkpointer: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("{0}")]
    Run(#[from] RunError),
}

/// Checkpoints kept per thread. A thread is resumed from its latest checkpoint, so
/// older ones only serve `list`.
pub const MAX_CHECKPOINTS_PER_THREAD: usize = 20;

fn tool_registry(config: &ChatBuildConfig) -> ToolRegistry {
    ToolRegistry::new()
        .with(Box::new(TavilySearchTool::new(config.tavily_api_key.clone())))
        .with(Box::new(HumanAssistanceTool::new()))
}

fn checkpointer(
    config: &ChatBuildConfig,
) -> Result<Arc<dyn Checkpointer<ChatState>>, BuildRunnerError> {
    let saver: Arc<dyn Checkpointer<ChatState>> = match &config.db_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using sqlite checkpointer");
            Arc::new(
                SqliteSaver::<ChatState>::new(path, Arc::new(JsonSerializer))?
                    .with_max_checkpoints(MAX_CHECKPOINTS_PER_THREAD),
            )
        }
        None => Arc::new(
            MemorySaver::<ChatState>::new().with_max_checkpoints(MAX_CHECKPOINTS_PER_THREAD),
        ),
    };
    Ok(saver)
}

/// Wires the production runner.
///
/// The Tavily key may be missing (searches then answer with the missing-key text); the
/// Cohere key may not. Tool specs are bound to the model only in model routing.
pub fn build_chat_runner(config: &ChatBuildConfig) -> Result<ChatRunner, BuildRunnerError> {
    let api_key = config
        .cohere_api_key
        .clone()
        .ok_or(BuildRunnerError::MissingCohereKey)?;
    let tools = tool_registry(config);

    let mut llm = CohereChat::new(api_key, config.cohere_model.clone());
    if let Some(url) = &config.cohere_base_url {
        llm = llm.with_base_url(url.clone());
    }
    if config.routing == RoutingMode::Model {
        llm = llm.with_tools(tools.list());
    }

    let runner = ChatRunner::new(
        Arc::new(llm),
        tools,
        checkpointer(config)?,
        config.thread_id.clone(),
        config.options(),
    )?;
    tracing::info!(
        thread_id = %runner.thread_id(),
        model = %config.cohere_model,
        routing = ?config.routing,
        persistent = config.db_path.is_some(),
        "chat runner ready"
    );
    Ok(runner)
}
