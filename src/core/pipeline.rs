//! Pipeline domain model

use crate::core::{
    condition::RunCondition,
    config::PipelineConfig,
    state::{ExecutionStatus, PipelineState, StepState},
    step::{Step, StepAction},
};

/// A pipeline definition plus the state of its current run
#[derive(Debug, Clone)]
pub struct Pipeline {
    /// Pipeline name
    pub name: String,

    /// Branch the pipeline checks out and pushes to
    pub branch: String,

    /// Steps, in execution order
    pub steps: Vec<Step>,

    /// Execution state
    pub state: PipelineState,
}

impl Pipeline {
    /// Create a pipeline from configuration
    ///
    /// The order is fixed: setup, the configured build scripts, change
    /// detection, then the two publishing steps gated on the diff flag.
    pub fn from_config(config: &PipelineConfig) -> Self {
        let timeout = config.timeout_secs;
        let branch = config.trigger.branch.clone();

        let mut steps = vec![
            Step::new(
                "checkout",
                "Checkout repository",
                StepAction::Checkout {
                    config: config.checkout.clone(),
                    branch: branch.clone(),
                },
                RunCondition::Always,
                timeout,
            ),
            Step::new(
                "setup_python",
                "Set up Python",
                StepAction::SetupRuntime(config.runtime.clone()),
                RunCondition::Always,
                timeout,
            ),
            Step::new(
                "install_dependencies",
                "Install dependencies",
                StepAction::InstallDependencies(config.dependencies.clone()),
                RunCondition::Always,
                timeout,
            ),
            Step::new(
                "python_version",
                "Print Python version",
                StepAction::PrintVersion,
                RunCondition::Always,
                timeout,
            ),
        ];

        steps.extend(config.builds.iter().map(|build| {
            Step::new(
                build.id.clone(),
                build.display_name(),
                StepAction::Build(build.clone()),
                RunCondition::Always,
                timeout,
            )
        }));

        steps.push(Step::new(
            "detect_changes",
            "Detect changes",
            StepAction::DetectChanges,
            RunCondition::Always,
            timeout,
        ));
        steps.push(Step::new(
            "commit_and_push",
            "Commit and push changes",
            StepAction::Publish {
                config: config.publish.clone(),
                remote: config.checkout.remote.clone(),
                branch: branch.clone(),
            },
            RunCondition::WhenChanged,
            timeout,
        ));
        steps.push(Step::new(
            "deploy",
            "Deploy via SFTP",
            StepAction::Deploy(config.deploy.clone()),
            RunCondition::WhenChangedAfter("commit_and_push".to_string()),
            timeout,
        ));

        Pipeline {
            name: config.name.clone(),
            branch,
            steps,
            state: PipelineState::new(),
        }
    }

    /// Get a step by ID
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get a mutable step by ID
    pub fn step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    /// Step IDs in execution order
    pub fn execution_order(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.id.clone()).collect()
    }

    /// Check if every step reached a terminal state
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.state.is_terminal())
    }

    /// Check if pipeline has failed
    pub fn has_failed(&self) -> bool {
        self.state.status == ExecutionStatus::Failed
    }

    /// The step that failed the run, if any
    pub fn failed_step(&self) -> Option<&Step> {
        self.steps
            .iter()
            .find(|s| matches!(s.state, StepState::Failed { .. }))
    }

    /// Recount step states into the pipeline state
    pub fn update_counts(&mut self) {
        let mut completed = 0;
        let mut failed = 0;
        let mut skipped = 0;

        for step in &self.steps {
            match &step.state {
                StepState::Completed { .. } => completed += 1,
                StepState::Failed { .. } => failed += 1,
                StepState::Skipped { .. } => skipped += 1,
                _ => {}
            }
        }

        self.state.total_steps = self.steps.len();
        self.state.completed_steps = completed;
        self.state.failed_steps = failed;
        self.state.skipped_steps = skipped;
    }
}
