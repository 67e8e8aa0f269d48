//! Logging initialization: logs never mix with the conversation on stdout.
//!
//! - **RUST_LOG**: filter, e.g. `info`, `parley=debug`. Default `info` (`debug` with `-v`).
//! - **LOG_FILE**: when set, logs are appended to this file (plain text, no ANSI) through
//!   a non-blocking writer. Otherwise logs go to stderr with `-v`; without it no
//!   subscriber is installed.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Clone, PartialEq, Eq)]
enum LogTarget {
    File(PathBuf),
    Stderr,
    Off,
}

fn target(log_file: Option<String>, verbose: bool) -> LogTarget {
    match log_file.filter(|p| !p.trim().is_empty()) {
        Some(path) => LogTarget::File(PathBuf::from(path)),
        None if verbose => LogTarget::Stderr,
        None => LogTarget::Off,
    }
}

fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "debug,hyper_util=off"
        } else {
            "info,hyper_util=off"
        })
    })
}

/// Installs the global subscriber. Keep the returned guard alive until exit so buffered
/// file logs are flushed.
pub fn init(verbose: bool) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    match target(std::env::var("LOG_FILE").ok(), verbose) {
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| format!("LOG_FILE has no file name: {}", path.display()))?;
            std::fs::create_dir_all(dir)?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter(verbose));
            tracing_subscriber::registry().with(file_layer).try_init()?;
            tracing::info!(path = %path.display(), "parley logging to file");
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter(verbose));
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(None)
        }
        LogTarget::Off => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_wins_then_verbose_then_nothing() {
        assert_eq!(
            target(Some("/tmp/parley.log".into()), false),
            LogTarget::File(PathBuf::from("/tmp/parley.log"))
        );
        assert_eq!(target(None, true), LogTarget::Stderr);
        assert_eq!(target(Some("  ".into()), true), LogTarget::Stderr);
        assert_eq!(target(None, false), LogTarget::Off);
    }
}
