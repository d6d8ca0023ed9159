//! slask - a plugin-driven chat bot core
//!
//! Plugin units register handlers under hook names. Incoming events are
//! routed by type and fanned out to every handler of the matching hook; the
//! non-empty replies are joined and sent back to the originating channel.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
