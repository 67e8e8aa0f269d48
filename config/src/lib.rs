//! Load configuration from XDG `config.toml` and project `.env`, then apply it to the
//! process environment with priority: **existing env > .env > XDG**.
//!
//! The chat runner and CLI only read environment variables (`COHERE_API_KEY`,
//! `TAVILY_API_KEY`, `PARLEY_DB_PATH`, ...), so this crate's whole job is filling in the
//! ones the user did not export.

mod dotenv_file;
mod xdg_toml;

use std::collections::{HashMap, HashSet};
use std::path::Path;

use thiserror::Error;

pub use xdg_toml::config_file_path;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    Dotenv(String),
}

/// Picks the value for each key missing from `present`: `.env` first, then XDG.
fn merge(
    dotenv_map: &HashMap<String, String>,
    xdg_map: &HashMap<String, String>,
    present: impl Fn(&str) -> bool,
) -> Vec<(String, String)> {
    let keys: HashSet<&String> = dotenv_map.keys().chain(xdg_map.keys()).collect();
    let mut out: Vec<(String, String)> = keys
        .into_iter()
        .filter(|k| !present(k))
        .filter_map(|k| {
            dotenv_map
                .get(k)
                .or_else(|| xdg_map.get(k))
                .map(|v| (k.clone(), v.clone()))
        })
        .collect();
    out.sort();
    out
}

/// Loads `$XDG_CONFIG_HOME/<app_name>/config.toml` and the project `.env`, then sets each
/// variable that is **not** already set in the process environment.
///
/// * `app_name`: e.g. `"parley"`; selects `~/.config/<app_name>/config.toml`.
/// * `override_dir`: look for `.env` here instead of the current directory.
///
/// Returns the names of the variables it set.
pub fn load_and_apply(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<Vec<String>, LoadError> {
    let xdg_map = xdg_toml::load_env_map(app_name)?;
    let dotenv_map = dotenv_file::load_env_map(override_dir)?;

    let mut applied = Vec::new();
    for (key, value) in merge(&dotenv_map, &xdg_map, |k| std::env::var_os(k).is_some()) {
        std::env::set_var(&key, value);
        applied.push(key);
    }
    Ok(applied)
}

/// Serializes tests that touch the process environment.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
