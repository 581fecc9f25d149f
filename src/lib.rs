//! contribs-pipeline - builds the contributions listing, commits it back and
//! uploads it to the download host

pub mod actions;
pub mod cli;
pub mod core;
pub mod execution;
pub mod lock;
pub mod persistence;
pub mod process;
pub mod trigger;

// Re-export commonly used types
pub use core::config::PipelineConfig;
pub use core::{ExecutionStatus, Pipeline, RunContext, Secrets, Step, StepState};
pub use execution::{run_pipeline, run_scheduled, ExecutionEngine, ExecutionEvent, PipelineError, RunOptions, RunOutcome};
pub use process::{CommandOutput, CommandRunner, CommandSpec, RunnerError, SubprocessRunner};
pub use trigger::{DailySchedule, TriggerEvent};
