//! Step domain model

use crate::core::{
    condition::RunCondition,
    config::{BuildConfig, CheckoutConfig, DependencyConfig, DeployConfig, PublishConfig, RuntimeConfig},
    state::StepState,
};

/// A single step in a pipeline
#[derive(Debug, Clone)]
pub struct Step {
    /// Unique step identifier
    pub id: String,

    /// Human-readable step name
    pub name: String,

    /// What the step does
    pub action: StepAction,

    /// Gate evaluated right before the step would run
    pub condition: RunCondition,

    /// Timeout in seconds
    pub timeout_secs: u64,

    /// Runtime state
    pub state: StepState,
}

/// The work performed by a step
#[derive(Debug, Clone)]
pub enum StepAction {
    /// Materialize a clean working copy of `branch`
    Checkout {
        config: CheckoutConfig,
        branch: String,
    },
    /// Locate an interpreter matching the runtime requirement
    SetupRuntime(RuntimeConfig),
    /// Upgrade the installer and install the optional manifest
    InstallDependencies(DependencyConfig),
    /// Print the interpreter version
    PrintVersion,
    /// Run one build script
    Build(BuildConfig),
    /// Compute the diff flag
    DetectChanges,
    /// Commit the working tree and push it back
    Publish {
        config: PublishConfig,
        remote: String,
        branch: String,
    },
    /// Upload the output directory over SFTP
    Deploy(DeployConfig),
}

impl Step {
    /// Create a pending step
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        action: StepAction,
        condition: RunCondition,
        timeout_secs: u64,
    ) -> Self {
        Step {
            id: id.into(),
            name: name.into(),
            action,
            condition,
            timeout_secs,
            state: StepState::Pending,
        }
    }

    /// Whether the step mutates something outside the working copy
    pub fn has_external_effects(&self) -> bool {
        matches!(
            self.action,
            StepAction::Publish { .. } | StepAction::Deploy(_)
        )
    }
}
