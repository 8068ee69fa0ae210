//! Configuration loading
//!
//! Settings come in three layers, weakest first: built-in defaults, an
//! optional `config.toml` in the data directory, then environment
//! variables. CLI flags are applied on top by the binary. Nothing here is
//! global; the result is an explicit `JarvisConfig` handed to each
//! component at construction time.

use crate::{JarvisConfig, JarvisError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Schema of `config.toml`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Path to the persistent memory file
    pub memory_file: Option<PathBuf>,

    /// How many recent entries the context injector fetches
    pub recent_limit: Option<usize>,

    /// Budget for the injector's store fetch, in milliseconds
    pub context_timeout_ms: Option<u64>,

    /// Base instructions handed to the agent runtime
    pub base_instructions: Option<String>,

    /// Extra memory-retrieval keywords merged into the built-in set
    #[serde(default)]
    pub keywords: Vec<String>,

    pub interceptor: Option<InterceptorSection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InterceptorSection {
    pub enabled: Option<bool>,
}

/// Resolve the Jarvis data directory: `$JARVIS_HOME`, else `~/.jarvis`.
pub fn jarvis_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("JARVIS_HOME") {
        return Ok(PathBuf::from(home));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| JarvisError::Config("could not find home directory".to_string()))?;
    Ok(home.join(".jarvis"))
}

/// Load the effective configuration for `data_dir`.
///
/// An explicitly given config path must exist; the default
/// `{data_dir}/config.toml` is optional. A malformed file is a startup
/// error — the only kind of memory-adjacent failure that is allowed to
/// stop the assistant.
pub fn load(data_dir: PathBuf, config_path: Option<&Path>) -> Result<JarvisConfig> {
    let file = read_config_file(&data_dir, config_path)?;
    let mut config = JarvisConfig::new(data_dir);

    if let Some(path) = file.memory_file {
        config = config.with_memory_file(path);
    }
    if let Some(limit) = file.recent_limit {
        config = config.with_recent_limit(limit);
    }
    if let Some(ms) = file.context_timeout_ms {
        config = config.with_context_timeout(Duration::from_millis(ms));
    }
    if let Some(instructions) = file.base_instructions {
        config = config.with_base_instructions(instructions);
    }
    if !file.keywords.is_empty() {
        config = config.with_extra_keywords(file.keywords);
    }
    if let Some(enabled) = file.interceptor.and_then(|i| i.enabled) {
        config = config.with_interceptor(enabled);
    }

    // Environment overrides the file.
    if let Ok(path) = std::env::var("JARVIS_MEMORY_FILE") {
        config = config.with_memory_file(PathBuf::from(path));
    }
    if let Ok(raw) = std::env::var("JARVIS_RECENT_LIMIT") {
        let limit = raw.parse().map_err(|_| {
            JarvisError::Config(format!(
                "JARVIS_RECENT_LIMIT must be a number, got '{}'",
                raw
            ))
        })?;
        config = config.with_recent_limit(limit);
    }
    if let Ok(raw) = std::env::var("JARVIS_INTERCEPTOR") {
        config = config.with_interceptor(parse_bool_flag(&raw));
    }

    Ok(config)
}

fn read_config_file(data_dir: &Path, explicit: Option<&Path>) -> Result<ConfigFile> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(JarvisError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let default = data_dir.join("config.toml");
            if !default.exists() {
                return Ok(ConfigFile::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| {
        JarvisError::Config(format!("invalid config file {}: {}", path.display(), e))
    })
}

fn parse_bool_flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_jarvis_home_resolves() {
        // Should not panic regardless of the environment.
        let result = jarvis_home();
        assert!(result.is_ok());
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load(temp_dir.path().to_path_buf(), None).unwrap();

        assert_eq!(config.recent_limit, crate::DEFAULT_RECENT_LIMIT);
        assert!(config.interceptor_enabled);
        assert_eq!(config.memory_file, temp_dir.path().join("memory.json"));
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.toml"),
            r#"
recent_limit = 3
context_timeout_ms = 100
keywords = ["flashback"]

[interceptor]
enabled = false
"#,
        )
        .unwrap();

        let config = load(temp_dir.path().to_path_buf(), None).unwrap();
        assert_eq!(config.recent_limit, 3);
        assert_eq!(config.context_timeout, Duration::from_millis(100));
        assert_eq!(config.extra_keywords, vec!["flashback".to_string()]);
        assert!(!config.interceptor_enabled);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "recent_limit = \"not a number\"").unwrap();

        let result = load(temp_dir.path().to_path_buf(), Some(&path));
        assert!(matches!(result, Err(JarvisError::Config(_))));
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let result = load(temp_dir.path().to_path_buf(), Some(&missing));
        assert!(matches!(result, Err(JarvisError::Config(_))));
    }

    #[test]
    fn test_bool_flag_parsing() {
        assert!(parse_bool_flag("1"));
        assert!(parse_bool_flag("true"));
        assert!(parse_bool_flag("yes"));
        assert!(!parse_bool_flag("0"));
        assert!(!parse_bool_flag("FALSE"));
        assert!(!parse_bool_flag("off"));
    }
}
