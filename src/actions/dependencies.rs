//! Dependency installation

use crate::actions::{require_python, run_checked, StepError};
use crate::core::{config::DependencyConfig, RunContext};
use crate::process::{CommandRunner, CommandSpec};
use tracing::info;

/// Upgrade pip, then install the manifest if the working copy has one
///
/// A missing manifest is not an error; that part of the step does nothing.
pub async fn run(
    config: &DependencyConfig,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let python = require_python(context)?.program.clone();
    let mut notes = Vec::new();

    if config.upgrade_installer {
        run_checked(
            runner,
            CommandSpec::new(&python)
                .args(["-m", "pip", "install", "--upgrade", "pip"])
                .current_dir(&context.workdir),
        )
        .await?;
        notes.push("upgraded pip".to_string());
    }

    let manifest = config.manifest.to_string_lossy().to_string();
    if context.resolve(&config.manifest).is_file() {
        info!("Installing dependencies from {}", manifest);
        run_checked(
            runner,
            CommandSpec::new(&python)
                .args(["-m", "pip", "install", "-r"])
                .arg(manifest.as_str())
                .current_dir(&context.workdir),
        )
        .await?;
        notes.push(format!("installed {}", manifest));
    } else {
        info!("No {} found, nothing to install", manifest);
        notes.push(format!("no {}", manifest));
    }

    Ok(notes.join(", "))
}
