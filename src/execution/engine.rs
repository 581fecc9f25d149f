//! Main execution engine - orchestrates the entire pipeline run

use crate::{
    core::{ExecutionStatus, Pipeline, RunContext, StepState},
    execution::{ExecutionResult, StepExecutor},
    process::CommandRunner,
};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Reason recorded on every step after a failure
pub const PREVIOUS_STEP_FAILED: &str = "previous step failed";

/// Events that can occur during pipeline execution
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        execution_id: Uuid,
        pipeline_name: String,
        total_steps: usize,
    },
    StepStarted {
        step_id: String,
        name: String,
    },
    StepOutput {
        step_id: String,
        output: String,
    },
    StepCompleted {
        step_id: String,
        duration_ms: i64,
    },
    StepSkipped {
        step_id: String,
        reason: String,
    },
    StepFailed {
        step_id: String,
        error: String,
    },
    PipelineCompleted {
        execution_id: Uuid,
        status: ExecutionStatus,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("step '{step_id}' failed: {error}")]
    StepFailed { step_id: String, error: String },

    #[error("pipeline has already been executed ({0:?})")]
    AlreadyExecuted(ExecutionStatus),
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

/// Runs the steps of a pipeline in order, stopping at the first failure
pub struct ExecutionEngine<R> {
    executor: StepExecutor<R>,
    event_handlers: Mutex<Vec<EventHandler>>,
}

impl<R: CommandRunner> ExecutionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            executor: StepExecutor::new(runner),
            event_handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn runner(&self) -> &R {
        self.executor.runner()
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        if let Ok(mut handlers) = self.event_handlers.lock() {
            handlers.push(Arc::new(handler));
        }
    }

    /// Emit an event to all handlers
    fn emit_event(&self, event: ExecutionEvent) {
        let handlers = match self.event_handlers.lock() {
            Ok(handlers) => handlers.clone(),
            Err(_) => return,
        };
        for handler in handlers.iter() {
            handler(event.clone());
        }
    }

    /// Execute the entire pipeline
    ///
    /// Steps run strictly one after another. Once a step fails, every later
    /// step is marked skipped and the run is reported as failed. There are no
    /// retries.
    pub async fn execute(
        &self,
        pipeline: &mut Pipeline,
        context: &mut RunContext,
    ) -> Result<(), PipelineError> {
        if pipeline.state.status != ExecutionStatus::Pending {
            return Err(PipelineError::AlreadyExecuted(pipeline.state.status));
        }

        let execution_id = pipeline.state.execution_id;
        info!(
            "Starting pipeline execution: {} ({}, trigger: {})",
            pipeline.name, execution_id, context.trigger
        );
        pipeline.state.start(pipeline.steps.len());
        self.emit_event(ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name: pipeline.name.clone(),
            total_steps: pipeline.steps.len(),
        });

        let mut failure: Option<PipelineError> = None;

        for index in 0..pipeline.steps.len() {
            let step = pipeline.steps[index].clone();

            if failure.is_some() {
                self.mark_step_skipped(pipeline, index, PREVIOUS_STEP_FAILED.to_string());
                continue;
            }

            if let Some(reason) = step.condition.skip_reason(context) {
                info!("Skipping step {}: {}", step.id, reason);
                self.mark_step_skipped(pipeline, index, reason);
                continue;
            }

            let started_at = Utc::now();
            pipeline.steps[index].state = StepState::Running { started_at };
            self.emit_event(ExecutionEvent::StepStarted {
                step_id: step.id.clone(),
                name: step.name.clone(),
            });

            match self.executor.execute(&step, context).await {
                ExecutionResult::Success { output } => {
                    let completed_at = Utc::now();
                    context.set_step_output(&step.id, output.clone());
                    if !output.trim().is_empty() {
                        self.emit_event(ExecutionEvent::StepOutput {
                            step_id: step.id.clone(),
                            output: output.clone(),
                        });
                    }
                    pipeline.steps[index].state = StepState::Completed {
                        output,
                        started_at,
                        completed_at,
                    };
                    let duration_ms = pipeline.steps[index].state.duration_ms().unwrap_or_default();
                    self.emit_event(ExecutionEvent::StepCompleted {
                        step_id: step.id.clone(),
                        duration_ms,
                    });
                }
                ExecutionResult::Failed { error } => {
                    pipeline.steps[index].state = StepState::Failed {
                        error: error.clone(),
                        started_at,
                        failed_at: Utc::now(),
                    };
                    self.emit_event(ExecutionEvent::StepFailed {
                        step_id: step.id.clone(),
                        error: error.clone(),
                    });
                    failure = Some(PipelineError::StepFailed {
                        step_id: step.id.clone(),
                        error,
                    });
                }
            }

            pipeline.update_counts();
        }

        pipeline.update_counts();
        let status = pipeline.state.finish(failure.is_none());

        match &failure {
            Some(e) => error!("Pipeline execution failed: {} - {}", pipeline.name, e),
            None => info!("Pipeline execution finished: {} - {:?}", pipeline.name, status),
        }
        self.emit_event(ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn mark_step_skipped(&self, pipeline: &mut Pipeline, index: usize, reason: String) {
        let step = &mut pipeline.steps[index];
        if reason == PREVIOUS_STEP_FAILED {
            warn!("Step {} not run: {}", step.id, reason);
        }
        step.state = StepState::Skipped {
            reason: reason.clone(),
        };
        self.emit_event(ExecutionEvent::StepSkipped {
            step_id: step.id.clone(),
            reason,
        });
    }
}
