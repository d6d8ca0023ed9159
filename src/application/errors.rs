//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// The transport dropped the connection for good; the run loop stops.
    #[error("Disconnected: {0}")]
    Disconnected(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised while loading a plugin unit or running one of its handlers
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Load failed: {0}")]
    Load(String),

    #[error("Handler failed: {0}")]
    Handler(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PluginError {
    pub fn handler(msg: impl Into<String>) -> Self {
        PluginError::Handler(msg.into())
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
