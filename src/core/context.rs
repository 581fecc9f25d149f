//! Run context - state shared between the steps of one run

use crate::core::secrets::Secrets;
use crate::trigger::TriggerEvent;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Interpreter selected by the runtime provisioning step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonRuntime {
    /// Program used to invoke the interpreter
    pub program: String,

    pub version: semver::Version,

    /// Normalised architecture (x64, x86, arm64)
    pub architecture: String,
}

/// Execution context for a pipeline run
///
/// Lives for a single run only. Nothing in here is persisted: the next run
/// starts from a fresh context.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Working copy the steps operate on
    pub workdir: PathBuf,

    /// What started this run
    pub trigger: TriggerEvent,

    /// Interpreter chosen by `setup_python`
    pub python: Option<PythonRuntime>,

    /// Diff flag, computed once by `detect_changes`
    pub changed: Option<bool>,

    /// Outputs from completed steps (step_id -> output)
    pub step_outputs: HashMap<String, String>,

    /// Run-scoped credentials
    pub secrets: Secrets,

    /// Describe publish and deploy instead of performing them
    pub dry_run: bool,
}

impl RunContext {
    /// Create a new context for the given working copy
    pub fn new<P: AsRef<Path>>(workdir: P) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            trigger: TriggerEvent::Manual,
            python: None,
            changed: None,
            step_outputs: HashMap::new(),
            secrets: Secrets::default(),
            dry_run: false,
        }
    }

    pub fn with_trigger(mut self, trigger: TriggerEvent) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_secrets(mut self, secrets: Secrets) -> Self {
        self.secrets = secrets;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the output of a step
    pub fn set_step_output(&mut self, step_id: &str, output: String) {
        self.step_outputs.insert(step_id.to_string(), output);
    }

    /// Get the output of a step
    pub fn get_step_output(&self, step_id: &str) -> Option<&String> {
        self.step_outputs.get(step_id)
    }

    /// Whether a step completed successfully in this run
    pub fn has_completed(&self, step_id: &str) -> bool {
        self.step_outputs.contains_key(step_id)
    }

    /// Resolve a path relative to the working copy
    pub fn resolve<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }
}
