//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::application::errors::ConfigError;
use crate::plugins::builtin::BUILTIN_NAMES;

/// Bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Transport credential, required to run against the live service
    pub token: Option<String>,
    pub loglevel: String,
    pub logformat: LogFormat,
    /// Log destination; stderr when unset
    pub logfile: Option<PathBuf>,
    pub plugins: PluginConfig,
    pub poll_interval_ms: u64,
    pub api_base: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    Full,
    Compact,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PluginConfig {
    pub directory: PathBuf,
    /// Built-in plugins to register ahead of the directory, in this order
    pub builtins: Vec<String>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("plugins"),
            builtins: BUILTIN_NAMES.iter().map(|name| name.to_string()).collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            loglevel: "info".to_string(),
            logformat: LogFormat::Full,
            logfile: None,
            plugins: PluginConfig::default(),
            poll_interval_ms: 1000,
            api_base: "https://slack.com/api".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise start from defaults; env overrides apply last
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let config = if path.exists() {
            Self::load(&path)?
        } else {
            Config::default()
        };
        Ok(config.with_env())
    }

    pub fn with_env(mut self) -> Self {
        if let Ok(token) = std::env::var("SLASK_TOKEN") {
            self.token = Some(token);
        }
        if let Ok(level) = std::env::var("SLASK_LOGLEVEL") {
            self.loglevel = level;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue("poll-interval-ms must be positive".to_string()));
        }
        if self.loglevel.trim().is_empty() {
            return Err(ConfigError::InvalidValue("loglevel must not be empty".to_string()));
        }
        Ok(())
    }

    /// The token, or an error naming the missing field
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::MissingField("token".to_string()))
    }

    /// Token with everything but a short prefix hidden, for log lines
    pub fn masked_token(&self) -> String {
        match self.token.as_deref() {
            Some(token) => mask_token(token),
            None => "<unset>".to_string(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

pub fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(8).collect();
    if visible.len() == token.len() {
        "*".repeat(token.chars().count())
    } else {
        format!("{}...", visible)
    }
}
