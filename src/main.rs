use anyhow::{Context, Result};
use chrono::Utc;
use contribs_pipeline::cli::commands::{HistoryCommand, RunCommand, ScheduleCommand, ValidateCommand};
use contribs_pipeline::cli::output::*;
use contribs_pipeline::cli::{Cli, Command};
use contribs_pipeline::core::config::PipelineConfig;
use contribs_pipeline::execution::{
    run_pipeline, run_scheduled, ExecutionEngine, ExecutionEvent, RunOptions, RunOutcome,
};
use contribs_pipeline::persistence::{ExecutionSummary, InMemoryPersistence, PersistenceBackend};
use contribs_pipeline::process::SubprocessRunner;
use contribs_pipeline::trigger::DailySchedule;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    match &cli.command {
        Command::Run(cmd) => run_once(cmd).await?,
        Command::Validate(cmd) => validate_pipeline(cmd)?,
        Command::History(cmd) => show_history(cmd).await?,
        Command::Schedule(cmd) => run_schedule(cmd).await?,
    }

    Ok(())
}

async fn open_history(no_history: bool) -> Result<Arc<dyn PersistenceBackend>> {
    if no_history {
        return Ok(Arc::new(InMemoryPersistence::new()));
    }
    persistent_history().await
}

#[cfg(feature = "sqlite")]
async fn persistent_history() -> Result<Arc<dyn PersistenceBackend>> {
    let store = contribs_pipeline::persistence::SqliteExecutionStore::with_default_path().await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "sqlite"))]
async fn persistent_history() -> Result<Arc<dyn PersistenceBackend>> {
    tracing::warn!("Built without the sqlite feature; history is not kept");
    Ok(Arc::new(InMemoryPersistence::new()))
}

fn console_engine() -> ExecutionEngine<SubprocessRunner> {
    let engine = ExecutionEngine::new(SubprocessRunner::new());
    engine.add_event_handler(|event| match &event {
        ExecutionEvent::StepOutput { output, .. } => println!("{}", format_output(output, 5)),
        _ => println!("{}", format_execution_event(&event)),
    });
    engine
}

/// Print the outcome of a run; true if it failed
fn report(outcome: &RunOutcome, saved: bool) -> bool {
    match outcome {
        RunOutcome::Ignored { reason } => {
            println!("{} Not running: {}", INFO, reason);
            false
        }
        RunOutcome::Finished {
            pipeline,
            summary,
            result,
        } => {
            println!("\n{}", format_step_table(pipeline));
            if saved {
                println!(
                    "\n{} Execution saved to history (ID: {})",
                    INFO,
                    style(&summary.execution_id.to_string()[..8]).dim()
                );
            }
            match result {
                Ok(()) => {
                    println!(
                        "\n{} {} completed {}",
                        CHECK,
                        style(&pipeline.name).bold(),
                        style("successfully").green()
                    );
                    false
                }
                Err(e) => {
                    println!(
                        "\n{} {} {}",
                        CROSS,
                        style(&pipeline.name).bold(),
                        style("failed").red()
                    );
                    error!("{}", e);
                    true
                }
            }
        }
    }
}

async fn run_once(cmd: &RunCommand) -> Result<()> {
    let mut config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    if let Some(workdir) = &cmd.workdir {
        config.workdir = workdir.clone();
    }
    println!("{} Loaded pipeline: {}", INFO, style(&config.name).bold());

    let history = open_history(cmd.no_history).await?;
    let engine = console_engine();
    let trigger = cmd.trigger_event(&config.trigger.branch);
    let options = RunOptions {
        dry_run: cmd.dry_run,
        ..Default::default()
    };

    println!();
    let outcome = run_pipeline(&config, trigger, options, &engine, history.as_ref()).await?;
    if report(&outcome, !cmd.no_history) {
        std::process::exit(1);
    }

    Ok(())
}

async fn run_schedule(cmd: &ScheduleCommand) -> Result<()> {
    let config = PipelineConfig::from_file(&cmd.file).context("Failed to load pipeline config")?;
    let schedule = DailySchedule::parse(&config.trigger.schedule)?;
    let history = open_history(cmd.no_history).await?;
    let engine = console_engine();

    println!(
        "{} Scheduling {} {}",
        INFO,
        style(&config.name).bold(),
        style(schedule).cyan()
    );

    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        info!("Next run at {}", next.to_rfc3339());
        let wait = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let options = RunOptions {
            dry_run: cmd.dry_run,
            ..Default::default()
        };
        if let Some(outcome) = run_scheduled(&config, options, &engine, history.as_ref()).await {
            report(&outcome, !cmd.no_history);
        }

        if cmd.once {
            return Ok(());
        }
    }
}

fn validate_pipeline(cmd: &ValidateCommand) -> Result<()> {
    println!("{} Validating pipeline...", INFO);

    match PipelineConfig::from_file(&cmd.file) {
        Ok(config) => {
            let pipeline = config.to_pipeline();
            println!("{} Pipeline configuration is valid!", CHECK);
            println!("  Name: {}", style(&config.name).bold());
            println!("  Branch: {}", style(&config.trigger.branch).cyan());
            println!("  Schedule: {}", style(&config.trigger.schedule).cyan());
            println!("  Steps: {}", style(pipeline.execution_order().join(" -> ")).dim());

            if cmd.json {
                let json = serde_json::to_string_pretty(&config)?;
                println!("\n{}", json);
            }
            Ok(())
        }
        Err(e) => {
            println!("{} Validation failed:", CROSS);
            println!("  {}", style(format!("{:#}", e)).red());
            std::process::exit(1);
        }
    }
}

async fn show_history(cmd: &HistoryCommand) -> Result<()> {
    let store = open_history(false).await?;

    if let Some(exec_id_str) = &cmd.execution_id {
        let exec_id = uuid::Uuid::parse_str(exec_id_str).context("Invalid execution ID format")?;
        match store.load_execution(exec_id).await? {
            Some(summary) => print_execution_details(&summary, cmd.details)?,
            None => println!("{} Execution not found", WARN),
        }
        return Ok(());
    }

    let executions = if let Some(pipeline_name) = &cmd.pipeline {
        store.list_executions(pipeline_name, cmd.limit).await?
    } else {
        let mut all_execs = Vec::new();
        for pipeline in store.list_pipelines().await? {
            all_execs.extend(store.list_executions(&pipeline, cmd.limit).await?);
        }
        all_execs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all_execs.truncate(cmd.limit);
        all_execs
    };

    if cmd.json {
        let data = serde_json::json!({ "executions": executions });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if executions.is_empty() {
        println!("{} No executions found", INFO);
        return Ok(());
    }

    println!("{} Execution history (showing latest {}):", INFO, cmd.limit);
    for summary in &executions {
        println!("  {}", format_execution_summary(summary));
    }

    Ok(())
}

fn print_execution_details(summary: &ExecutionSummary, details: bool) -> Result<()> {
    println!("{} Execution Details", INFO);
    println!("  ID: {}", style(summary.execution_id).cyan());
    println!("  Pipeline: {}", style(&summary.pipeline_name).bold());
    println!("  Trigger: {}", summary.trigger);
    println!("  Status: {}", format_status(summary.status));
    println!("  Started: {}", style(summary.started_at.to_rfc3339()).dim());
    if let Some(completed) = summary.completed_at {
        println!("  Completed: {}", style(completed.to_rfc3339()).dim());
        if let Ok(duration) = completed.signed_duration_since(summary.started_at).to_std() {
            println!("  Duration: {}", style(format_duration(duration)).dim());
        }
    }
    println!("  Working tree: {}", format_changed(summary.changed));
    println!(
        "  Steps: {} completed, {} skipped, {} total",
        summary.completed_steps, summary.skipped_steps, summary.total_steps
    );
    if let (Some(step), Some(error)) = (&summary.failed_step, &summary.error) {
        println!("  Failed at: {}", style(step).red());
        println!("  Error: {}", style(error).dim());
    }

    if details {
        println!("\n  {}", style("Full details:").bold());
        let json = serde_json::to_string_pretty(summary)?;
        for line in json.lines() {
            println!("    {}", line);
        }
    }

    Ok(())
}

fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
