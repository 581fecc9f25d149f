//! Pipeline configuration from YAML

use crate::core::Pipeline;
use crate::trigger::schedule::DailySchedule;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Marker that stops the hosting platform from re-triggering on our own commit
pub const SKIP_CI_MARKER: &str = "[skip ci]";

/// Step ids that are always present, in order, around the build steps
pub const FIXED_STEP_IDS: &[&str] = &[
    "checkout",
    "setup_python",
    "install_dependencies",
    "python_version",
    "detect_changes",
    "commit_and_push",
    "deploy",
];

/// Top-level pipeline configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name
    #[serde(default = "default_name")]
    pub name: String,

    /// Working copy the pipeline operates on
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Timeout for each step (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub trigger: TriggerConfig,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub dependencies: DependencyConfig,

    /// Build scripts, run in order
    #[serde(default = "default_builds")]
    pub builds: Vec<BuildConfig>,

    #[serde(default)]
    pub publish: PublishConfig,

    #[serde(default)]
    pub deploy: DeployConfig,
}

/// When the pipeline runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Primary branch; pushes to other branches are ignored
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Daily schedule in cron notation (UTC)
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// Clone URL. When absent the existing working copy is used in place.
    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Remove untracked files after fetching
    #[serde(default = "default_true")]
    pub clean: bool,

    /// Use an existing working copy as it is, without fetching or resetting
    #[serde(default)]
    pub in_place: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Semver requirement for the interpreter, e.g. "3.x" or ">=3.9"
    #[serde(default = "default_python")]
    pub python: String,

    /// Required architecture: x64, x86 or arm64
    #[serde(default = "default_architecture")]
    pub architecture: String,

    /// Interpreters probed in order
    #[serde(default = "default_candidates")]
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyConfig {
    /// Optional requirements file, relative to the workdir
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    #[serde(default = "default_true")]
    pub upgrade_installer: bool,
}

/// A single build script invocation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildConfig {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Directory the script runs in, relative to the workdir
    #[serde(default = "default_scripts_dir")]
    pub dir: PathBuf,

    pub script: String,

    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    #[serde(default = "default_committer_name")]
    pub committer_name: String,

    #[serde(default = "default_committer_email")]
    pub committer_email: String,

    #[serde(default = "default_commit_message")]
    pub message: String,

    /// Environment variable holding the repository write token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Push URL override; defaults to the checkout remote's URL
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Directory whose top-level files are uploaded, relative to the workdir
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,

    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host_env")]
    pub host_env: String,

    #[serde(default = "default_user_env")]
    pub user_env: String,

    #[serde(default = "default_key_env")]
    pub key_env: String,
}

fn default_name() -> String {
    "Build contributions".to_string()
}

fn default_workdir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_secs() -> u64 {
    3600
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_schedule() -> String {
    "45 3 * * *".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_python() -> String {
    "3.x".to_string()
}

fn default_architecture() -> String {
    "x64".to_string()
}

fn default_candidates() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

fn default_manifest() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}

fn default_builds() -> Vec<BuildConfig> {
    vec![
        BuildConfig {
            id: "build_contribs".to_string(),
            name: Some("Build contribs.txt".to_string()),
            dir: default_scripts_dir(),
            script: "build_contribs.py".to_string(),
            args: Vec::new(),
        },
        BuildConfig {
            id: "build_json".to_string(),
            name: Some("Build JSON files".to_string()),
            dir: default_scripts_dir(),
            script: "build_json.py".to_string(),
            args: Vec::new(),
        },
    ]
}

fn default_committer_name() -> String {
    "github-actions[bot]".to_string()
}

fn default_committer_email() -> String {
    "github-actions[bot]@users.noreply.github.com".to_string()
}

fn default_commit_message() -> String {
    format!("chore(ci): update contributions {}", SKIP_CI_MARKER)
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("pde")
}

fn default_remote_dir() -> String {
    "/var/www/download/contribs".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_host_env() -> String {
    "SSH_HOST".to_string()
}

fn default_user_env() -> String {
    "SSH_USERNAME".to_string()
}

fn default_key_env() -> String {
    "SSH_PRIVATE_KEY".to_string()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            schedule: default_schedule(),
        }
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            repository: None,
            remote: default_remote(),
            clean: true,
            in_place: false,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            architecture: default_architecture(),
            candidates: default_candidates(),
        }
    }
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            upgrade_installer: true,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            committer_name: default_committer_name(),
            committer_email: default_committer_email(),
            message: default_commit_message(),
            token_env: default_token_env(),
            url: None,
        }
    }
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            local_dir: default_local_dir(),
            remote_dir: default_remote_dir(),
            port: default_port(),
            host_env: default_host_env(),
            user_env: default_user_env(),
            key_env: default_key_env(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            workdir: default_workdir(),
            timeout_secs: default_timeout_secs(),
            trigger: TriggerConfig::default(),
            checkout: CheckoutConfig::default(),
            runtime: RuntimeConfig::default(),
            dependencies: DependencyConfig::default(),
            builds: default_builds(),
            publish: PublishConfig::default(),
            deploy: DeployConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Human-readable name, falling back to the script
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Run {}", self.script))
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the pipeline configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen_ids = HashSet::new();
        for build in &self.builds {
            if FIXED_STEP_IDS.contains(&build.id.as_str()) {
                anyhow::bail!("Build id '{}' collides with a built-in step", build.id);
            }
            if !seen_ids.insert(&build.id) {
                anyhow::bail!("Duplicate build id: {}", build.id);
            }
            if build.script.trim().is_empty() {
                anyhow::bail!("Build '{}' has an empty script", build.id);
            }
        }

        if !self.publish.message.contains(SKIP_CI_MARKER) {
            anyhow::bail!(
                "Commit message must contain '{}' to avoid re-triggering: {}",
                SKIP_CI_MARKER,
                self.publish.message
            );
        }

        if !self.deploy.remote_dir.starts_with('/') {
            anyhow::bail!(
                "Deploy remote_dir must be absolute: {}",
                self.deploy.remote_dir
            );
        }

        semver::VersionReq::parse(&self.runtime.python).with_context(|| {
            format!("Invalid runtime requirement '{}'", self.runtime.python)
        })?;

        if self.runtime.candidates.is_empty() {
            anyhow::bail!("At least one runtime candidate is required");
        }

        DailySchedule::parse(&self.trigger.schedule)
            .with_context(|| format!("Invalid schedule '{}'", self.trigger.schedule))?;

        Ok(())
    }

    /// Environment variables holding credentials, masked in all output
    pub fn secret_names(&self) -> Vec<&str> {
        vec![self.publish.token_env.as_str(), self.deploy.key_env.as_str()]
    }

    /// Environment variables holding deploy settings, read alongside the secrets
    pub fn setting_names(&self) -> Vec<&str> {
        vec![self.deploy.host_env.as_str(), self.deploy.user_env.as_str()]
    }

    /// Convert config to a Pipeline domain model
    pub fn to_pipeline(&self) -> Pipeline {
        Pipeline::from_config(self)
    }
}
