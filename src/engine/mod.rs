//! Enhancement Engine Module
//!
//! Sequences the run stages:
//! - Run state machine
//! - The four-stage pipeline and its report

pub mod pipeline;
pub mod state;

pub use pipeline::{Pipeline, RunReport};
pub use state::RunState;
