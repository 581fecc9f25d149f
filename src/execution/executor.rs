//! Step executor - runs individual steps against a command runner

use crate::{
    actions,
    core::{RunContext, Step},
    process::CommandRunner,
};
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info};

/// Result of executing a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Step completed successfully
    Success { output: String },
    /// Step failed; the run stops here
    Failed { error: String },
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }
}

/// Executes a single step
pub struct StepExecutor<R> {
    runner: R,
}

impl<R: CommandRunner> StepExecutor<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Execute a step and return the result
    ///
    /// Output and error text pass through secret redaction before they leave
    /// the executor.
    pub async fn execute(&self, step: &Step, context: &mut RunContext) -> ExecutionResult {
        info!("Executing step: {}", step.id);
        if context.dry_run && step.has_external_effects() {
            info!("Dry run: {} will only describe its actions", step.id);
        }

        let timeout_duration = Duration::from_secs(step.timeout_secs);
        let result = timeout(
            timeout_duration,
            actions::perform(step, context, &self.runner),
        )
        .await;

        match result {
            Ok(Ok(output)) => {
                let output = context.secrets.redact(&output);
                debug!("Output of step {}: {}", step.id, output);
                info!("Step {} completed successfully", step.id);
                ExecutionResult::Success { output }
            }
            Ok(Err(e)) => {
                let error = context.secrets.redact(&e.to_string());
                error!("Step {} failed: {}", step.id, error);
                ExecutionResult::Failed { error }
            }
            Err(_) => {
                error!("Timeout for step {} after {}s", step.id, step.timeout_secs);
                ExecutionResult::Failed {
                    error: format!("Timeout after {} seconds", step.timeout_secs),
                }
            }
        }
    }
}
