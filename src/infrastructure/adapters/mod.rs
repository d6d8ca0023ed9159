//! Transport adapters

pub mod console;
pub mod slack;

pub use console::ConsoleAdapter;
pub use slack::SlackAdapter;
