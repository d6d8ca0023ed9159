//! Plugin loading for slask
//!
//! Plugin units are shared libraries dropped into the plugin directory. Each
//! exports `slask_plugin_init`, see [`declare_plugin!`](crate::declare_plugin).

pub mod loader;

pub use loader::{LibraryLoader, LoadedUnit, PluginLoader};
