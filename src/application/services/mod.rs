//! Application services - the run loop and the interactive harness

pub mod harness;
pub mod run_loop;

pub use harness::Harness;
pub use run_loop::{poll_once, run};
