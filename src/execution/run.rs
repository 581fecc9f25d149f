//! One complete run: trigger check, lock, steps, history

use crate::{
    core::{config::PipelineConfig, Pipeline, RunContext, Secrets},
    execution::{ExecutionEngine, PipelineError},
    lock::RunLock,
    persistence::{create_summary, ExecutionSummary, PersistenceBackend},
    process::CommandRunner,
    trigger::{TriggerDecision, TriggerEvent},
};
use anyhow::Result;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Knobs for a single run
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub dry_run: bool,

    /// Directory holding the run lock; the local data dir when unset
    pub lock_dir: Option<PathBuf>,

    /// Credentials; read from the environment when unset
    pub secrets: Option<Secrets>,
}

/// What happened to a trigger
#[derive(Debug)]
pub enum RunOutcome {
    /// The trigger does not start a run
    Ignored { reason: String },

    /// The pipeline ran; `result` holds the failing step, if any
    Finished {
        pipeline: Pipeline,
        summary: ExecutionSummary,
        result: Result<(), PipelineError>,
    },
}

impl RunOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, RunOutcome::Finished { result: Err(_), .. })
    }
}

/// Evaluate the trigger and, if it fires, run the pipeline once
///
/// A held lock is an error; a failing step is not, it is reported through
/// `RunOutcome::Finished` after the run has been saved to history.
pub async fn run_pipeline<R: CommandRunner>(
    config: &PipelineConfig,
    trigger: TriggerEvent,
    options: RunOptions,
    engine: &ExecutionEngine<R>,
    history: &dyn PersistenceBackend,
) -> Result<RunOutcome> {
    if let TriggerDecision::Ignore(reason) = trigger.evaluate(&config.trigger) {
        info!("Not running {}: {}", config.name, reason);
        return Ok(RunOutcome::Ignored { reason });
    }

    let _lock = match &options.lock_dir {
        Some(dir) => RunLock::acquire_in(dir, &config.name)?,
        None => RunLock::acquire(&config.name)?,
    };

    let secrets = options
        .secrets
        .unwrap_or_else(|| {
            Secrets::from_env(config.secret_names()).with_plain_env(config.setting_names())
        });
    let mut context = RunContext::new(&config.workdir)
        .with_trigger(trigger)
        .with_secrets(secrets)
        .with_dry_run(options.dry_run);

    let mut pipeline = config.to_pipeline();
    let result = engine.execute(&mut pipeline, &mut context).await;

    let summary = create_summary(&pipeline, &context);
    history.save_execution(&summary).await?;

    Ok(RunOutcome::Finished {
        pipeline,
        summary,
        result,
    })
}

/// One tick of the daily schedule
///
/// Never fails: a run that cannot start (e.g. the lock is held) or that
/// fails is logged, and the schedule carries on with the next tick.
pub async fn run_scheduled<R: CommandRunner>(
    config: &PipelineConfig,
    options: RunOptions,
    engine: &ExecutionEngine<R>,
    history: &dyn PersistenceBackend,
) -> Option<RunOutcome> {
    match run_pipeline(config, TriggerEvent::Schedule, options, engine, history).await {
        Ok(outcome) => {
            if let RunOutcome::Finished { result: Err(e), .. } = &outcome {
                warn!("Scheduled run of {} failed: {}", config.name, e);
            }
            Some(outcome)
        }
        Err(e) => {
            error!("Scheduled run of {} did not start: {:#}", config.name, e);
            None
        }
    }
}
