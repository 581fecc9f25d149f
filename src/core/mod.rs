//! Core domain models for the pipeline
//!
//! This module defines the configuration, the ordered step list and the
//! per-run state the execution engine works on.

pub mod config;
pub mod pipeline;
pub mod step;
pub mod condition;
pub mod context;
pub mod secrets;
pub mod state;

pub use pipeline::*;
pub use step::*;
pub use context::*;
pub use state::*;
pub use condition::RunCondition;
pub use secrets::Secrets;
