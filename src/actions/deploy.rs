//! Deploy - upload the output directory over SFTP

use crate::actions::{require_secret, run_checked, StepError};
use crate::core::{config::DeployConfig, RunContext};
use crate::process::{CommandRunner, CommandSpec};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files directly under `dir`, sorted by name
///
/// Symlinks are followed; subdirectories are not descended into. A dangling
/// link is an error.
pub fn collect_upload_files(dir: &Path) -> Result<Vec<PathBuf>, StepError> {
    let entries = fs::read_dir(dir).map_err(|e| StepError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| StepError::io(dir, e))?.path();
        let metadata = fs::metadata(&path).map_err(|e| StepError::io(&path, e))?;
        if metadata.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Quote a path for an sftp batch file
fn sftp_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

/// One `put` per file, overwriting remote files of the same name
pub fn build_batch_script(files: &[PathBuf], remote_dir: &str) -> String {
    let remote_dir = remote_dir.trim_end_matches('/');
    let mut script = String::new();
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        script.push_str(&format!(
            "put {} {}\n",
            sftp_quote(&file.to_string_lossy()),
            sftp_quote(&format!("{}/{}", remote_dir, name))
        ));
    }
    script
}

/// Write the deploy key readable by the owner only
pub fn write_private_key(path: &Path, key: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(key.trim_end().as_bytes())?;
    // ssh refuses keys without the trailing newline
    file.write_all(b"\n")?;
    Ok(())
}

/// Upload every top-level file of the output directory to the remote path
pub async fn run(
    config: &DeployConfig,
    context: &mut RunContext,
    runner: &dyn CommandRunner,
) -> Result<String, StepError> {
    let local_dir = context.resolve(&config.local_dir);
    if !local_dir.is_dir() {
        return Err(StepError::Precondition(format!(
            "output directory {} does not exist",
            local_dir.display()
        )));
    }

    let files = collect_upload_files(&local_dir)?;
    if files.is_empty() {
        warn!("{} is empty, nothing to upload", local_dir.display());
        return Ok("nothing to upload".to_string());
    }

    if context.dry_run {
        return Ok(format!(
            "dry run: would upload {} file(s) to {}",
            files.len(),
            config.remote_dir
        ));
    }

    let host = require_secret(context, &config.host_env)?.to_string();
    let user = require_secret(context, &config.user_env)?.to_string();
    let key = require_secret(context, &config.key_env)?.to_string();

    // removed when the step ends, whatever the outcome
    let material = tempfile::Builder::new()
        .prefix("contribs-deploy-")
        .tempdir()
        .map_err(|e| StepError::io(&std::env::temp_dir(), e))?;

    let scan = run_checked(
        runner,
        CommandSpec::new("ssh-keyscan")
            .args(["-p", &config.port.to_string(), "-H"])
            .arg(host.as_str()),
    )
    .await?;
    if scan.stdout.trim().is_empty() {
        return Err(StepError::Precondition(
            "ssh-keyscan returned no host keys for the deploy host".to_string(),
        ));
    }

    let known_hosts = material.path().join("known_hosts");
    fs::write(&known_hosts, &scan.stdout).map_err(|e| StepError::io(&known_hosts, e))?;

    let key_path = material.path().join("deploy_key");
    write_private_key(&key_path, &key).map_err(|e| StepError::io(&key_path, e))?;

    let batch_path = material.path().join("batch");
    let batch = build_batch_script(&files, &config.remote_dir);
    fs::write(&batch_path, batch).map_err(|e| StepError::io(&batch_path, e))?;

    info!("Uploading {} file(s) to {}", files.len(), config.remote_dir);
    run_checked(
        runner,
        CommandSpec::new("sftp")
            .arg("-b")
            .arg(batch_path.to_string_lossy())
            .arg("-i")
            .arg(key_path.to_string_lossy())
            .args(["-o", "IdentitiesOnly=yes"])
            .args(["-o", "StrictHostKeyChecking=yes"])
            .arg("-o")
            .arg(format!("UserKnownHostsFile={}", known_hosts.display()))
            .args(["-P", &config.port.to_string()])
            .arg(format!("{}@{}", user, host)),
    )
    .await?;

    Ok(format!(
        "uploaded {} file(s) to {}",
        files.len(),
        config.remote_dir
    ))
}
