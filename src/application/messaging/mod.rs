//! Event handling - routing and hook dispatch

pub mod dispatcher;
pub mod router;

pub use dispatcher::{invoke, DispatchResult};
pub use router::{is_routed, route};
