//! Trigger events and the decision whether a run should start

pub mod schedule;

use crate::core::config::{TriggerConfig, SKIP_CI_MARKER};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use schedule::{DailySchedule, ScheduleError};

/// What started a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerEvent {
    /// A push to `branch`, with the head commit message when known
    Push {
        branch: String,
        message: Option<String>,
    },
    /// The daily schedule fired
    Schedule,
    /// Started by hand
    Manual,
}

/// Outcome of evaluating a trigger against the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerDecision {
    Run,
    Ignore(String),
}

impl TriggerEvent {
    /// Short label stored in the run history
    pub fn label(&self) -> &'static str {
        match self {
            TriggerEvent::Push { .. } => "push",
            TriggerEvent::Schedule => "schedule",
            TriggerEvent::Manual => "manual",
        }
    }

    /// Decide whether this event starts a run
    ///
    /// Pushes to other branches are ignored, as are pushes whose head commit
    /// carries the skip marker. That covers the pipeline's own commits.
    pub fn evaluate(&self, config: &TriggerConfig) -> TriggerDecision {
        match self {
            TriggerEvent::Push { branch, message } => {
                let branch = branch.strip_prefix("refs/heads/").unwrap_or(branch);
                if branch != config.branch {
                    return TriggerDecision::Ignore(format!(
                        "push to '{}' (only '{}' triggers a run)",
                        branch, config.branch
                    ));
                }
                if message
                    .as_deref()
                    .is_some_and(|m| m.contains(SKIP_CI_MARKER))
                {
                    return TriggerDecision::Ignore(format!(
                        "head commit message contains {}",
                        SKIP_CI_MARKER
                    ));
                }
                TriggerDecision::Run
            }
            TriggerEvent::Schedule | TriggerEvent::Manual => TriggerDecision::Run,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::Push { branch, .. } => write!(f, "push to {}", branch),
            TriggerEvent::Schedule => write!(f, "schedule"),
            TriggerEvent::Manual => write!(f, "manual"),
        }
    }
}
