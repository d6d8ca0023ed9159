//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite storage handed to plugins
//! - Logging: tracing subscriber setup
//! - Adapters: Slack and the offline console
//! - Plugins: loading plugin units from shared libraries

pub mod adapters;
pub mod config;
pub mod database;
pub mod logging;
pub mod plugins;
