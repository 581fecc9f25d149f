//! Python runtime provisioning and the version diagnostic

use crate::actions::{require_python, run_checked, StepError};
use crate::core::{config::RuntimeConfig, PythonRuntime, RunContext};
use crate::process::{CommandRunner, CommandSpec};
use regex::Regex;
use semver::{Version, VersionReq};
use tracing::{debug, info};

const MACHINE_PROBE: &str = "import platform; print(platform.machine())";

/// Parse `Python 3.11.4` style version output
pub fn parse_python_version(text: &str) -> Option<Version> {
    let re = Regex::new(r"Python\s+(\d+)\.(\d+)(?:\.(\d+))?").ok()?;
    let caps = re.captures(text)?;
    let major = caps.get(1)?.as_str().parse().ok()?;
    let minor = caps.get(2)?.as_str().parse().ok()?;
    let patch = caps
        .get(3)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

/// Map the many spellings of a machine architecture onto x64, x86 and arm64
pub fn normalize_architecture(machine: &str) -> String {
    let machine = machine.trim().to_lowercase();
    match machine.as_str() {
        "x86_64" | "amd64" | "x64" => "x64".to_string(),
        "i386" | "i686" | "x86" => "x86".to_string(),
        "aarch64" | "arm64" => "arm64".to_string(),
        _ => machine,
    }
}

/// Find the first candidate interpreter satisfying the requirement and architecture
pub async fn setup(
    config: &RuntimeConfig,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let requirement = VersionReq::parse(&config.python).map_err(|e| {
        StepError::Precondition(format!("invalid runtime requirement '{}': {}", config.python, e))
    })?;
    let wanted = normalize_architecture(&config.architecture);

    for candidate in &config.candidates {
        let output = match runner.run(&CommandSpec::new(candidate).arg("--version")).await {
            Ok(output) if output.is_success() => output,
            Ok(output) => {
                debug!("{} --version exited with {}", candidate, output.exit_code);
                continue;
            }
            Err(e) => {
                debug!("{} is not available: {}", candidate, e);
                continue;
            }
        };

        // Python 2 prints its version on stderr
        let text = format!("{}{}", output.stdout, output.stderr);
        let Some(version) = parse_python_version(&text) else {
            debug!("Could not parse version from {}: {}", candidate, text.trim());
            continue;
        };
        if !requirement.matches(&version) {
            info!("{} {} does not satisfy {}", candidate, version, config.python);
            continue;
        }

        let machine = match runner.run(&CommandSpec::new(candidate).args(["-c", MACHINE_PROBE])).await {
            Ok(output) if output.is_success() => output.stdout,
            _ => continue,
        };
        let architecture = normalize_architecture(&machine);
        if architecture != wanted {
            info!("{} {} is {}, need {}", candidate, version, architecture, wanted);
            continue;
        }

        info!("Using {} {} ({})", candidate, version, architecture);
        let summary = format!("{} {} ({})", candidate, version, architecture);
        context.python = Some(PythonRuntime {
            program: candidate.clone(),
            version,
            architecture,
        });
        return Ok(summary);
    }

    Err(StepError::RuntimeNotFound {
        requirement: config.python.clone(),
        architecture: wanted,
    })
}

/// Print the selected interpreter's version
pub async fn print_version(
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let python = require_python(context)?.program.clone();
    let output = run_checked(runner, CommandSpec::new(python).arg("--version")).await?;
    let version = format!("{}{}", output.stdout, output.stderr).trim().to_string();
    info!("{}", version);
    Ok(version)
}
