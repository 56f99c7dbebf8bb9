//! Scope and engine configuration.
//!
//! Read from TOML; every field has a default so an empty file is valid:
//!
//! ```toml
//! [scope]
//! name = "main"
//! bootstrap = "bootstrap.js"
//! dealloc_function = "ScopeDealloc"
//!
//! [engine]
//! thread_name = "js-engine"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scope: ScopeConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("[config] Loaded {}", path.display());
        Ok(config)
    }
}

/// Per-scope settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Descriptive scope name, used in logs
    #[serde(default = "default_scope_name")]
    pub name: String,
    /// Resource name of the bootstrap script
    #[serde(default = "default_bootstrap")]
    pub bootstrap: String,
    /// Global function called by `will_exit`
    #[serde(default = "default_dealloc_function")]
    pub dealloc_function: String,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            name: default_scope_name(),
            bootstrap: default_bootstrap(),
            dealloc_function: default_dealloc_function(),
        }
    }
}

fn default_scope_name() -> String {
    "scope".to_string()
}

fn default_bootstrap() -> String {
    "bootstrap.js".to_string()
}

fn default_dealloc_function() -> String {
    "ScopeDealloc".to_string()
}

/// Engine thread settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_thread_name")]
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
        }
    }
}

fn default_thread_name() -> String {
    "js-engine".to_string()
}
