//! Domain layer - Core types with no transport or storage concerns
//!
//! This layer contains:
//! - Entities: events, users and the session snapshot
//! - Traits: the transport abstraction the run loop drives

pub mod entities;
pub mod traits;
