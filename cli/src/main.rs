//! Parley CLI binary: chat with the agent from the terminal.
//!
//! Configuration comes from the environment (see `ChatBuildConfig::from_env`), filled in
//! from `.env` and `~/.config/parley/config.toml`; flags override it.

mod logging;
mod repl;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use parley::{build_chat_runner, ChatBuildConfig, RoutingMode};
use tokio::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Chat with a model that can search the web and ask a human for help")]
struct Args {
    /// Send one message, print the reply and exit
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Thread to continue (default: PARLEY_THREAD_ID or a new id)
    #[arg(long, value_name = "ID")]
    thread_id: Option<String>,

    /// SQLite file for persistent threads (default: PARLEY_DB_PATH or in-memory)
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Who decides on tool use: the model, or search keywords in the message
    #[arg(long, value_name = "MODE")]
    routing: Option<RoutingMode>,

    /// Cohere model name (default: COHERE_MODEL)
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// System prompt for new threads
    #[arg(long, value_name = "TEXT")]
    system_prompt: Option<String>,

    /// Debug logging (to stderr unless LOG_FILE is set)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut ChatBuildConfig) {
        if let Some(id) = &self.thread_id {
            config.thread_id = id.clone();
        }
        if let Some(db) = &self.db {
            config.db_path = Some(db.clone());
        }
        if let Some(routing) = self.routing {
            config.routing = routing;
        }
        if let Some(model) = &self.model {
            config.cohere_model = model.clone();
        }
        if let Some(prompt) = &self.system_prompt {
            config.system_prompt = Some(prompt.clone());
        }
    }
}

/// Resolves on Ctrl-C; never, if the handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config_error = config::load_and_apply("parley", None).err();
    let args = Args::parse();

    let _log_guard = match logging::init(args.verbose) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("parley: logging: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "config not loaded");
        eprintln!("parley: config: {}", e);
    }

    let mut chat_config = match ChatBuildConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("parley: {}", e);
            return ExitCode::FAILURE;
        }
    };
    args.apply(&mut chat_config);
    let runner = match build_chat_runner(&chat_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("parley: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let input = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let result = match &args.message {
        Some(message) => repl::run_once(&runner, message, input, ctrl_c(), &mut stdout).await,
        None => {
            println!("Thread: {}", runner.thread_id());
            repl::run_repl(&runner, input, ctrl_c(), &mut stdout).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "session aborted");
            eprintln!("parley: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ChatBuildConfig {
        ChatBuildConfig {
            tavily_api_key: None,
            cohere_api_key: Some("k".into()),
            cohere_model: "command-r-plus".into(),
            cohere_base_url: None,
            db_path: None,
            thread_id: "from-env".into(),
            system_prompt: None,
            routing: RoutingMode::Model,
        }
    }

    #[test]
    fn flags_override_environment_config() {
        let args = Args::try_parse_from([
            "parley",
            "--thread-id",
            "t-9",
            "--db",
            "/tmp/chat.db",
            "--routing",
            "keyword",
            "--model",
            "command-r",
            "--system-prompt",
            "Be brief.",
        ])
        .unwrap();
        let mut cfg = base();
        args.apply(&mut cfg);
        assert_eq!(cfg.thread_id, "t-9");
        assert_eq!(cfg.db_path, Some(PathBuf::from("/tmp/chat.db")));
        assert_eq!(cfg.routing, RoutingMode::Keyword);
        assert_eq!(cfg.cohere_model, "command-r");
        assert_eq!(cfg.system_prompt.as_deref(), Some("Be brief."));
    }

    #[test]
    fn absent_flags_keep_environment_config() {
        let args = Args::try_parse_from(["parley", "-m", "hello", "-v"]).unwrap();
        assert_eq!(args.message.as_deref(), Some("hello"));
        assert!(args.verbose);
        let mut cfg = base();
        args.apply(&mut cfg);
        assert_eq!(cfg.thread_id, "from-env");
        assert_eq!(cfg.routing, RoutingMode::Model);
        assert!(cfg.db_path.is_none());
    }

    #[test]
    fn unknown_routing_is_rejected() {
        assert!(Args::try_parse_from(["parley", "--routing", "magic"]).is_err());
    }
}
