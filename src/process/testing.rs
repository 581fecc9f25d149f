//! Scripted runner for unit tests

use crate::process::{CommandOutput, CommandRunner, CommandSpec, RunnerError};
use async_trait::async_trait;
use std::sync::Mutex;

/// Returns canned output for matching commands and records every call.
/// Unmatched commands succeed with empty output.
#[derive(Default)]
pub(crate) struct ScriptedRunner {
    rules: Vec<(String, Vec<String>, CommandOutput)>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn on(mut self, program: &str, prefix: &[&str], output: CommandOutput) -> Self {
        self.rules.push((
            program.to_string(),
            prefix.iter().map(|s| s.to_string()).collect(),
            output,
        ));
        self
    }

    pub(crate) fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn called(&self, program: &str, prefix: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|c| c.program == program && c.args_start_with(prefix))
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, RunnerError> {
        self.calls.lock().unwrap().push(spec.clone());
        let output = self
            .rules
            .iter()
            .find(|(program, prefix, _)| {
                *program == spec.program
                    && prefix.len() <= spec.args.len()
                    && prefix.iter().zip(&spec.args).all(|(p, a)| p == a)
            })
            .map(|(_, _, output)| output.clone())
            .unwrap_or_else(|| CommandOutput::success(""));
        Ok(output)
    }
}
