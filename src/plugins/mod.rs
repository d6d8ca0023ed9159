//! Plugin system for slask
//!
//! Plugin units expose handlers keyed by hook name. The registry collects them
//! once at start-up; the dispatcher runs them per event.

pub mod builtin;
pub mod guard;
pub mod registry;
pub mod trait_def;

pub use registry::{HelpIndex, HookEntry, HookTable, PluginRegistry};
pub use trait_def::{handler, FnPlugin, Handler, HandlerResult, HookPayload, Plugin};
