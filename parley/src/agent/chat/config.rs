//! Options for a chat runner and configuration for building one from the environment.

use std::path::PathBuf;
use std::str::FromStr;

use crate::llm::DEFAULT_COHERE_MODEL;

use super::{BuildRunnerError, HandleToolErrors};

/// How the chatbot step decides on tool use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoutingMode {
    /// The model sees the tools and requests them itself.
    #[default]
    Model,
    /// Messages mentioning `search` / `lookup` go straight to web search.
    Keyword,
}

impl FromStr for RoutingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "model" => Ok(Self::Model),
            "keyword" => Ok(Self::Keyword),
            _ => Err(format!("unknown routing: {} (use model or keyword)", s)),
        }
    }
}

/// Per-runner options.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub routing: RoutingMode,
    /// Seeded as the first message of a new thread.
    pub system_prompt: Option<String>,
    pub handle_tool_errors: HandleToolErrors,
}

/// Everything `build_chat_runner` needs: keys, model, persistence and thread.
#[derive(Debug, Clone)]
pub struct ChatBuildConfig {
    pub tavily_api_key: Option<String>,
    pub cohere_api_key: Option<String>,
    pub cohere_model: String,
    pub cohere_base_url: Option<String>,
    /// SQLite file for checkpoints. When `None`, history lives in memory only.
    pub db_path: Option<PathBuf>,
    pub thread_id: String,
    pub system_prompt: Option<String>,
    pub routing: RoutingMode,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Unset means the default; anything else must name a mode.
fn routing_from(value: Option<String>) -> Result<RoutingMode, BuildRunnerError> {
    match value {
        None => Ok(RoutingMode::default()),
        Some(v) => v.trim().parse().map_err(BuildRunnerError::InvalidRouting),
    }
}

impl ChatBuildConfig {
    /// Builds config from environment variables. No variable is required here; a missing
    /// Cohere key is reported by `build_chat_runner`. A `PARLEY_ROUTING` that names no
    /// mode is an error.
    ///
    /// Reads: `TAVILY_API_KEY`, `COHERE_API_KEY`, `COHERE_MODEL`, `COHERE_BASE_URL`,
    /// `PARLEY_DB_PATH`, `PARLEY_THREAD_ID` (fresh UUID v4 when unset),
    /// `PARLEY_SYSTEM_PROMPT`, `PARLEY_ROUTING` (`model` | `keyword`).
    pub fn from_env() -> Result<Self, BuildRunnerError> {
        Ok(Self {
            tavily_api_key: non_empty_var("TAVILY_API_KEY"),
            cohere_api_key: non_empty_var("COHERE_API_KEY"),
            cohere_model: non_empty_var("COHERE_MODEL")
                .unwrap_or_else(|| DEFAULT_COHERE_MODEL.to_string()),
            cohere_base_url: non_empty_var("COHERE_BASE_URL"),
            db_path: non_empty_var("PARLEY_DB_PATH").map(PathBuf::from),
            thread_id: non_empty_var("PARLEY_THREAD_ID")
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            system_prompt: non_empty_var("PARLEY_SYSTEM_PROMPT"),
            routing: routing_from(non_empty_var("PARLEY_ROUTING"))?,
        })
    }

    pub fn options(&self) -> ChatOptions {
        ChatOptions {
            routing: self.routing,
            system_prompt: self.system_prompt.clone(),
            handle_tool_errors: HandleToolErrors::default(),
        }
    }
}
