//! Build scripts

use crate::actions::{require_python, run_checked, StepError};
use crate::core::{config::BuildConfig, RunContext};
use crate::process::{CommandRunner, CommandSpec};
use tracing::info;

/// Run one build script from its directory
///
/// The script's working directory is set on the child process only; the
/// orchestrator's own directory never changes.
pub async fn run(
    build: &BuildConfig,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let python = require_python(context)?.program.clone();
    let dir = context.resolve(&build.dir);
    if !dir.is_dir() {
        return Err(StepError::Precondition(format!(
            "build directory {} does not exist",
            dir.display()
        )));
    }

    info!("Running {} in {}", build.script, dir.display());
    let output = run_checked(
        runner,
        CommandSpec::new(python)
            .arg(build.script.as_str())
            .args(build.args.iter().cloned())
            .current_dir(&dir),
    )
    .await?;

    for line in output.stdout.lines() {
        info!(step = %build.id, "{}", line);
    }

    Ok(output.stdout)
}
