//! Run conditions gating optional steps

use crate::core::context::RunContext;

/// Decides whether a step runs once the steps before it have finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCondition {
    /// Always run
    Always,

    /// Run only if the working tree differs from the last commit
    WhenChanged,

    /// Run only if the working tree changed and the named step completed
    WhenChangedAfter(String),
}

impl RunCondition {
    /// Reason the step must be skipped, or `None` if it should run
    pub fn skip_reason(&self, context: &RunContext) -> Option<String> {
        match self {
            RunCondition::Always => None,
            RunCondition::WhenChanged => changed_skip_reason(context),
            RunCondition::WhenChangedAfter(step_id) => {
                changed_skip_reason(context).or_else(|| {
                    if context.has_completed(step_id) {
                        None
                    } else {
                        Some(format!("step '{}' did not complete", step_id))
                    }
                })
            }
        }
    }
}

fn changed_skip_reason(context: &RunContext) -> Option<String> {
    match context.changed {
        Some(true) => None,
        Some(false) => Some("no changes in working tree".to_string()),
        None => Some("changes were not detected".to_string()),
    }
}
