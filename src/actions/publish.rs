//! Commit the generated files and push them back

use crate::actions::{git, require_secret, run_checked, StepError};
use crate::core::{config::PublishConfig, RunContext};
use crate::process::CommandRunner;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::info;

/// HTTP header authenticating a push with a repository token
///
/// Handed to git through `GIT_CONFIG_*` environment variables so the token
/// never lands in the command line, the remote URL or `.git/config`.
pub fn auth_header(token: &str) -> String {
    let credentials = STANDARD.encode(format!("x-access-token:{}", token));
    format!("AUTHORIZATION: basic {}", credentials)
}

/// Commit the working tree with the fixed message and push it to `branch`
///
/// A rejected push (e.g. someone else pushed first) fails the step; the local
/// commit is left in place.
pub async fn run(
    config: &PublishConfig,
    remote: &str,
    branch: &str,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let target = config.url.as_deref().unwrap_or(remote).to_string();
    let refspec = format!("HEAD:refs/heads/{}", branch);

    if context.dry_run {
        return Ok(format!(
            "dry run: would commit \"{}\" and push to {} {}",
            config.message, target, branch
        ));
    }

    let header = auth_header(require_secret(context, &config.token_env)?);
    if let Some(credentials) = header.rsplit(' ').next() {
        context.secrets.mask(credentials);
    }

    run_checked(
        runner,
        git(context).args(["config", "user.name", config.committer_name.as_str()]),
    )
    .await?;
    run_checked(
        runner,
        git(context).args(["config", "user.email", config.committer_email.as_str()]),
    )
    .await?;
    run_checked(runner, git(context).args(["add", "-A"])).await?;
    run_checked(runner, git(context).args(["commit", "-m", config.message.as_str()])).await?;

    let head = run_checked(runner, git(context).args(["rev-parse", "HEAD"])).await?;
    let head = head.stdout.trim().to_string();
    info!("Committed {}", head);

    run_checked(
        runner,
        git(context)
            .env("GIT_CONFIG_COUNT", "1")
            .env("GIT_CONFIG_KEY_0", "http.extraheader")
            .env("GIT_CONFIG_VALUE_0", header)
            .args(["push", target.as_str(), refspec.as_str()]),
    )
    .await?;
    info!("Pushed {} to {}", head, branch);

    Ok(head)
}
