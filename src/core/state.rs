//! Run state for the pipeline and each of its steps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Pending,
    Running,
    /// Every step completed or was skipped by its condition
    Completed,
    /// A step failed; the remaining steps were skipped
    Failed,
}

impl ExecutionStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }
}

/// State of a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StepState {
    Pending,
    Running {
        started_at: DateTime<Utc>,
    },
    Completed {
        /// Redacted text the step produced (a commit id, `changed=1`, ...)
        output: String,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    },
    Failed {
        error: String,
        started_at: DateTime<Utc>,
        failed_at: DateTime<Utc>,
    },
    /// Did not run: its condition was false or an earlier step failed
    Skipped {
        reason: String,
    },
}

impl StepState {
    /// Whether the step has reached a final state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Completed { .. } | StepState::Failed { .. } | StepState::Skipped { .. }
        )
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            StepState::Completed { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            StepState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Wall time of a step that ran to completion or failure
    pub fn duration_ms(&self) -> Option<i64> {
        match self {
            StepState::Completed {
                started_at,
                completed_at,
                ..
            } => Some((*completed_at - *started_at).num_milliseconds()),
            StepState::Failed {
                started_at,
                failed_at,
                ..
            } => Some((*failed_at - *started_at).num_milliseconds()),
            _ => None,
        }
    }
}

/// State of one run of the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub execution_id: Uuid,
    pub status: ExecutionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,

    pub total_steps: usize,
    pub completed_steps: usize,
    pub failed_steps: usize,
    pub skipped_steps: usize,
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            status: ExecutionStatus::Pending,
            started_at: None,
            completed_at: None,
            total_steps: 0,
            completed_steps: 0,
            failed_steps: 0,
            skipped_steps: 0,
        }
    }

    /// Mark the run as started
    pub fn start(&mut self, total_steps: usize) {
        self.status = ExecutionStatus::Running;
        self.started_at = Some(Utc::now());
        self.total_steps = total_steps;
    }

    /// Mark the run as finished and return the final status
    pub fn finish(&mut self, succeeded: bool) -> ExecutionStatus {
        self.status = if succeeded {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        self.completed_at = Some(Utc::now());
        self.status
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}
