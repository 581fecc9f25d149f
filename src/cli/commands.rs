//! CLI command definitions

use crate::trigger::TriggerEvent;
use clap::Args;
use std::path::PathBuf;

/// Run the pipeline once
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// What started this run
    #[arg(long, value_enum, default_value_t = TriggerArg::Manual)]
    pub trigger: TriggerArg,

    /// Branch that was pushed (push trigger; defaults to the configured branch)
    #[arg(long)]
    pub branch: Option<String>,

    /// Head commit message of the push
    #[arg(long)]
    pub message: Option<String>,

    /// Working copy override
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Describe commit, push and upload instead of performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Don't save execution to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a pipeline configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show execution history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent executions to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show full details
    #[arg(long)]
    pub details: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Show a specific execution
    #[arg(long)]
    pub execution_id: Option<String>,
}

/// Run the pipeline on its daily schedule
#[derive(Debug, Args, Clone)]
pub struct ScheduleCommand {
    /// Path to pipeline YAML file
    #[arg(short, long, default_value = "pipeline.yaml")]
    pub file: PathBuf,

    /// Wait for the next fire time, run once and exit
    #[arg(long)]
    pub once: bool,

    /// Describe commit, push and upload instead of performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Don't save executions to history
    #[arg(long)]
    pub no_history: bool,
}

/// Trigger argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TriggerArg {
    Push,
    Schedule,
    Manual,
}

impl RunCommand {
    /// The trigger event described by the arguments
    pub fn trigger_event(&self, default_branch: &str) -> TriggerEvent {
        match self.trigger {
            TriggerArg::Push => TriggerEvent::Push {
                branch: self
                    .branch
                    .clone()
                    .unwrap_or_else(|| default_branch.to_string()),
                message: self.message.clone(),
            },
            TriggerArg::Schedule => TriggerEvent::Schedule,
            TriggerArg::Manual => TriggerEvent::Manual,
        }
    }
}
