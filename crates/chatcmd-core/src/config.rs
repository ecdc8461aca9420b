//! Configuration resolution for chatcmd.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`<config dir>/chatcmd/settings.json`)
//! 3. Project config (`.chatcmd/settings.json`)
//! 4. Environment variables
//! 5. CLI arguments (applied by the host, highest priority)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Prefix recognised when nothing else is configured.
pub const DEFAULT_PREFIX: &str = "-";

/// Complete chatcmd configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Chat messages starting with this are treated as commands.
    pub prefix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Partial config as found in a settings file; absent keys keep lower layers.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    dispatch: DispatchFile,
    #[serde(default)]
    logging: LoggingFile,
}

#[derive(Debug, Default, Deserialize)]
struct DispatchFile {
    prefix: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingFile {
    level: Option<String>,
    json: Option<bool>,
}

impl Config {
    /// Reject settings the dispatcher cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.prefix.is_empty() {
            return Err(Error::Config("Command prefix must not be empty".into()));
        }
        if self.dispatch.prefix.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!(
                "Command prefix {:?} must not contain whitespace",
                self.dispatch.prefix
            )));
        }
        Ok(())
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    // Load global config
    if let Some(global_path) = global_config_path() {
        if global_path.exists() {
            let global = load_config_file(&global_path)?;
            merge_config(&mut config, global);
        }
    }

    // Load project config
    if let Some(dir) = project_dir {
        let project_path = project_config_path(dir);
        if project_path.exists() {
            let project = load_config_file(&project_path)?;
            merge_config(&mut config, project);
        }
    }

    apply_env_overrides(&mut config);

    config.validate()?;
    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("chatcmd").join("settings.json"))
}

/// Get the project config file path under `dir`.
pub fn project_config_path(dir: &Path) -> PathBuf {
    dir.join(".chatcmd").join("settings.json")
}

fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}

fn merge_config(base: &mut Config, overlay: ConfigFile) {
    if let Some(prefix) = overlay.dispatch.prefix {
        base.dispatch.prefix = prefix;
    }
    if let Some(level) = overlay.logging.level {
        base.logging.level = level;
    }
    if let Some(json) = overlay.logging.json {
        base.logging.json = json;
    }
}

fn apply_env_overrides(config: &mut Config) {
    if let Ok(val) = std::env::var("CHATCMD_PREFIX") {
        config.dispatch.prefix = val;
    }
    if let Ok(val) = std::env::var("CHATCMD_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Ok(val) = std::env::var("CHATCMD_LOG_JSON") {
        if let Ok(json) = val.parse() {
            config.logging.json = json;
        }
    }
}
