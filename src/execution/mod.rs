//! Pipeline execution engine

pub mod engine;
pub mod executor;
pub mod run;

pub use engine::{EventHandler, ExecutionEngine, ExecutionEvent, PipelineError, PREVIOUS_STEP_FAILED};
pub use executor::{ExecutionResult, StepExecutor};
pub use run::{run_pipeline, run_scheduled, RunOptions, RunOutcome};
