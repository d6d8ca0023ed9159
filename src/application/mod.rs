//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Context: what every plugin handler is given
//! - Messaging: event routing and hook dispatch
//! - Services: the run loop and the interactive harness
//! - Errors: error taxonomy

pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;
