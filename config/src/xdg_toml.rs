//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! ```toml
//! [env]
//! COHERE_API_KEY = "..."
//! PARLEY_DB_PATH = "/home/me/.local/share/parley/threads.db"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::LoadError;

/// Where `config.toml` for `app_name` lives: `$XDG_CONFIG_HOME/<app>/config.toml`, falling
/// back to the platform config dir.
pub fn config_file_path(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(dirs::config_dir)
        .ok_or_else(|| LoadError::XdgPath("no config directory for this user".to_string()))?;
    Ok(base.join(app_name).join("config.toml"))
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, String>,
}

/// Missing file or missing `[env]` yields an empty map.
pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    let path = config_file_path(app_name)?;
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(&path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENV_LOCK;
    use std::env;

    fn with_xdg<T>(files: &[(&str, &str)], f: impl FnOnce() -> T) -> T {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let dir = tempfile::tempdir().unwrap();
        for (app, content) in files {
            let app_dir = dir.path().join(app);
            std::fs::create_dir_all(&app_dir).unwrap();
            std::fs::write(app_dir.join("config.toml"), content).unwrap();
        }
        let prev = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", dir.path());
        let out = f();
        match prev {
            Some(p) => env::set_var("XDG_CONFIG_HOME", p),
            None => env::remove_var("XDG_CONFIG_HOME"),
        }
        out
    }

    #[test]
    fn reads_env_table() {
        let map = with_xdg(
            &[("parley", "[env]\nCOHERE_MODEL = \"command-r\"\nPARLEY_ROUTING = \"keyword\"\n")],
            || load_env_map("parley"),
        )
        .unwrap();
        assert_eq!(map.get("COHERE_MODEL").map(String::as_str), Some("command-r"));
        assert_eq!(map.get("PARLEY_ROUTING").map(String::as_str), Some("keyword"));
    }

    #[test]
    fn missing_file_or_section_is_empty() {
        let (missing, no_env) = with_xdg(&[("other", "[ui]\ntheme = \"dark\"\n")], || {
            (load_env_map("parley"), load_env_map("other"))
        });
        assert!(missing.unwrap().is_empty());
        assert!(no_env.unwrap().is_empty());
    }

    #[test]
    fn path_follows_xdg_config_home() {
        let path = with_xdg(&[], || config_file_path("parley")).unwrap();
        assert!(path.ends_with("parley/config.toml"));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let result = with_xdg(&[("parley", "not valid toml [[[\n")], || load_env_map("parley"));
        assert!(matches!(result, Err(LoadError::XdgParse(_))));
    }
}
