//! Step implementations
//!
//! One module per kind of step. Each takes the step's configuration, the run
//! context and a `CommandRunner`, and returns the text recorded as the step's
//! output.

pub mod build;
pub mod changes;
pub mod checkout;
pub mod dependencies;
pub mod deploy;
pub mod publish;
pub mod runtime;

use crate::core::{PythonRuntime, RunContext, Step, StepAction};
use crate::process::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for step execution
#[derive(Debug, Error)]
pub enum StepError {
    #[error("`{command}` exited with code {code}: {detail}")]
    CommandFailed {
        command: String,
        code: i32,
        detail: String,
    },

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing secret: environment variable {0} is not set")]
    MissingSecret(String),

    #[error("no Python interpreter matching '{requirement}' on {architecture}")]
    RuntimeNotFound {
        requirement: String,
        architecture: String,
    },

    #[error("{0}")]
    Precondition(String),
}

impl StepError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StepError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Run the action of a step
pub async fn perform(
    step: &Step,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    match &step.action {
        StepAction::Checkout { config, branch } => {
            checkout::run(config, branch, context, runner).await
        }
        StepAction::SetupRuntime(config) => runtime::setup(config, context, runner).await,
        StepAction::InstallDependencies(config) => {
            dependencies::run(config, context, runner).await
        }
        StepAction::PrintVersion => runtime::print_version(context, runner).await,
        StepAction::Build(config) => build::run(config, context, runner).await,
        StepAction::DetectChanges => changes::run(context, runner).await,
        StepAction::Publish {
            config,
            remote,
            branch,
        } => publish::run(config, remote, branch, context, runner).await,
        StepAction::Deploy(config) => deploy::run(config, context, runner).await,
    }
}

/// Run a command and turn a non-zero exit into `StepError::CommandFailed`
pub(crate) async fn run_checked(
    runner: &dyn CommandRunner,
    spec: CommandSpec,
) -> Result<CommandOutput, StepError> {
    let output = runner.run(&spec).await?;
    if !output.is_success() {
        return Err(StepError::CommandFailed {
            command: spec.to_string(),
            code: output.exit_code,
            detail: output.diagnostic().to_string(),
        });
    }
    Ok(output)
}

/// A git command rooted at the working copy, never prompting for credentials
pub(crate) fn git(context: &RunContext) -> CommandSpec {
    CommandSpec::new("git")
        .current_dir(&context.workdir)
        .env("GIT_TERMINAL_PROMPT", "0")
}

/// The interpreter chosen by `setup_python`
pub(crate) fn require_python(context: &RunContext) -> Result<&PythonRuntime, StepError> {
    context.python.as_ref().ok_or_else(|| {
        StepError::Precondition("Python runtime has not been set up".to_string())
    })
}

/// A secret the step cannot run without
pub(crate) fn require_secret<'a>(
    context: &'a RunContext,
    name: &str,
) -> Result<&'a str, StepError> {
    context
        .secrets
        .get(name)
        .ok_or_else(|| StepError::MissingSecret(name.to_string()))
}
