//! Checkout - materialize a clean working copy

use crate::actions::{git, run_checked, StepError};
use crate::core::{config::CheckoutConfig, RunContext};
use crate::process::{CommandRunner, CommandSpec};
use tracing::info;

/// Clone or refresh the working copy, then report the checked out commit
///
/// An existing clone is always reset to the remote branch, unless
/// `in_place` asks for the tree to be used as it is.
pub async fn run(
    config: &CheckoutConfig,
    branch: &str,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let has_git = context.workdir.join(".git").exists();

    match (&config.repository, has_git) {
        (Some(url), false) => {
            if let Some(parent) = context.workdir.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).map_err(|e| StepError::io(parent, e))?;
            }
            info!("Cloning {} ({}) into {}", url, branch, context.workdir.display());
            run_checked(
                runner,
                CommandSpec::new("git")
                    .env("GIT_TERMINAL_PROMPT", "0")
                    .args(["clone", "--branch", branch, "--origin", config.remote.as_str()])
                    .arg(url.as_str())
                    .arg(context.workdir.to_string_lossy()),
            )
            .await?;
        }
        (None, false) => {
            return Err(StepError::Precondition(format!(
                "{} is not a git working copy and no repository is configured",
                context.workdir.display()
            )));
        }
        (_, true) if config.in_place => {
            info!("Using working copy {} as it is", context.workdir.display());
            run_checked(runner, git(context).args(["rev-parse", "--is-inside-work-tree"])).await?;
        }
        (_, true) => refresh(config, branch, context, runner).await?,
    }

    let head = run_checked(runner, git(context).args(["rev-parse", "HEAD"])).await?;
    let head = head.stdout.trim().to_string();
    info!("Working copy at {}", head);
    Ok(head)
}

/// Fetch the branch and force the working tree onto it
async fn refresh(
    config: &CheckoutConfig,
    branch: &str,
    context: &RunContext,
    runner: &dyn CommandRunner,
) -> Result<(), StepError> {
    info!("Refreshing {} from {}", branch, config.remote);
    run_checked(runner, git(context).args(["fetch", config.remote.as_str(), branch])).await?;

    let upstream = format!("{}/{}", config.remote, branch);
    run_checked(
        runner,
        git(context).args(["checkout", "--force", "-B", branch, upstream.as_str()]),
    )
    .await?;

    if config.clean {
        run_checked(runner, git(context).args(["clean", "-fd"])).await?;
    }
    Ok(())
}
