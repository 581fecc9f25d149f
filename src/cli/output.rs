//! CLI output formatting

use crate::{
    core::{ExecutionStatus, Pipeline, StepState},
    execution::ExecutionEvent,
    persistence::ExecutionSummary,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Format a step state for display
pub fn format_step_state(state: &StepState) -> String {
    match state {
        StepState::Pending => style("PENDING").dim().to_string(),
        StepState::Running { .. } => style("RUNNING").yellow().to_string(),
        StepState::Completed { .. } => style("COMPLETED").green().to_string(),
        StepState::Failed { .. } => style("FAILED").red().to_string(),
        StepState::Skipped { reason } => format!("{} ({})", style("SKIPPED").dim(), reason),
    }
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// Format the diff flag of a run
pub fn format_changed(changed: Option<bool>) -> String {
    match changed {
        Some(true) => style("changed").cyan().to_string(),
        Some(false) => style("unchanged").dim().to_string(),
        None => style("not checked").dim().to_string(),
    }
}

/// Format execution summary for display
pub fn format_execution_summary(summary: &ExecutionSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        _ => INFO,
    };

    let mut line = format!(
        "{} {} - {} - {} - {} [{}] ({}/{})",
        status_icon,
        style(&summary.execution_id.to_string()[..8]).dim(),
        style(summary.started_at.format("%Y-%m-%d %H:%M")).dim(),
        style(&summary.pipeline_name).bold(),
        format_status(summary.status),
        summary.trigger,
        summary.completed_steps,
        summary.total_steps,
    );
    if let Some(step) = &summary.failed_step {
        line.push_str(&format!(" at {}", style(step).red()));
    } else {
        line.push_str(&format!(" {}", format_changed(summary.changed)));
    }
    line
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            pipeline_name,
            total_steps,
        } => format!(
            "{} Starting pipeline {} ({}, {} steps)",
            ROCKET,
            style(pipeline_name).bold(),
            style(&execution_id.to_string()[..8]).dim(),
            total_steps
        ),
        ExecutionEvent::StepStarted { step_id, name } => {
            format!("{} {} {}", SPINNER, style(step_id).cyan(), style(name).dim())
        }
        ExecutionEvent::StepOutput { step_id, output } => {
            format!("{} Output from {}:\n{}", INFO, style(step_id).dim(), output)
        }
        ExecutionEvent::StepCompleted {
            step_id,
            duration_ms,
        } => format!(
            "{} {} {}",
            CHECK,
            style(step_id).green(),
            style(format!("({:.1}s)", *duration_ms as f64 / 1000.0)).dim()
        ),
        ExecutionEvent::StepSkipped { step_id, reason } => {
            format!("{} {}: {}", SKIP, style(step_id).dim(), style(reason).dim())
        }
        ExecutionEvent::StepFailed { step_id, error } => {
            format!("{} {}: {}", CROSS, style(step_id).red(), style(error).dim())
        }
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
        } => {
            let status_str = match status {
                ExecutionStatus::Completed => format!("{} completed", style("successfully").green()),
                ExecutionStatus::Failed => style("failed").red().to_string(),
                _ => format!("{:?}", status),
            };
            format!(
                "{} Pipeline ({}) {}",
                INFO,
                style(&execution_id.to_string()[..8]).dim(),
                status_str
            )
        }
    }
}

/// One line per step with its final state
pub fn format_step_table(pipeline: &Pipeline) -> String {
    let width = pipeline.steps.iter().map(|s| s.id.len()).max().unwrap_or(0);
    pipeline
        .steps
        .iter()
        .map(|step| {
            let line = format!(
                "  {:width$}  {}",
                step.id,
                format_step_state(&step.state),
                width = width
            );
            match step.state.duration_ms() {
                Some(ms) => format!("{} {}", line, style(format!("({:.1}s)", ms as f64 / 1000.0)).dim()),
                None => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
