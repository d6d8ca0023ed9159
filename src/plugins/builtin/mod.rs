//! Plugins compiled into the binary

pub mod echo;
pub mod help;
pub mod log;

use crate::plugins::trait_def::Plugin;

/// Names accepted in `plugins.builtins`
pub const BUILTIN_NAMES: &[&str] = &["echo", "help", "log"];

/// Construct a built-in plugin by name
pub fn builtin(name: &str) -> Option<Box<dyn Plugin>> {
    match name {
        "echo" => Some(Box::new(echo::EchoPlugin)),
        "help" => Some(Box::new(help::HelpPlugin)),
        "log" => Some(Box::new(log::LogPlugin)),
        _ => None,
    }
}
