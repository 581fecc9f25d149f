//! Subprocess runner backed by tokio

use crate::process::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Runs commands as child processes of the orchestrator
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    /// Spawn the command, wait for it and capture stdout/stderr
    ///
    /// # Errors
    /// Returns `RunnerError` if:
    /// - The program cannot be spawned
    /// - The command exceeds its timeout (the child is killed)
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        debug!("Spawning: {}", spec);

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let result = match spec.timeout {
            Some(limit) => timeout(limit, command.output())
                .await
                .map_err(|_| RunnerError::Timeout {
                    program: spec.program.clone(),
                    secs: limit.as_secs(),
                })?,
            None => command.output().await,
        };

        let output = result.map_err(|source| RunnerError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if exit_code != 0 {
            warn!("{} exited with code {}", spec.program, exit_code);
        }

        Ok(CommandOutput {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
