//! Domain entities - Core objects with no external dependencies

pub mod event;
pub mod user;

pub use event::Event;
pub use user::{Session, User};
