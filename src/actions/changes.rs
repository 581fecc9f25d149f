//! Change detection - computes the diff flag

use crate::actions::{git, run_checked, StepError};
use crate::core::RunContext;
use crate::process::CommandRunner;
use tracing::{debug, info};

/// Paths listed by `git status --porcelain`
///
/// Covers modified, staged, deleted and untracked files, so freshly generated
/// output files count as a change.
pub fn changed_paths(porcelain: &str) -> Vec<String> {
    porcelain
        .lines()
        .filter(|line| line.len() > 3)
        .map(|line| line[3..].to_string())
        .collect()
}

/// Compare the working tree with the last commit and set the diff flag
pub async fn run(context: &mut RunContext, runner: &dyn CommandRunner) -> Result<String, StepError> {
    let output = run_checked(
        runner,
        git(context).args(["status", "--porcelain", "--untracked-files=all"]),
    )
    .await?;

    let paths = changed_paths(&output.stdout);
    for path in &paths {
        debug!("changed: {}", path);
    }

    let changed = !paths.is_empty();
    context.changed = Some(changed);
    info!("{} changed path(s)", paths.len());

    Ok(format!("changed={}", u8::from(changed)))
}
