//! Run-level locking
//!
//! Two runs of the same pipeline must not overlap: both would commit and
//! push to the same branch. The lock file lives in the local data directory,
//! outside the working copy, so it never shows up as a change.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another run of this pipeline is in progress (lock: {0})")]
    Locked(PathBuf),

    #[error("Failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("Failed to acquire lock: {0}")]
    AcquireFailed(#[source] io::Error),
}

/// Holds the run lock until dropped
pub struct RunLock {
    _file: File,
    path: PathBuf,
}

impl RunLock {
    /// Try to take the lock for `pipeline_name` in the default location
    pub fn acquire(pipeline_name: &str) -> Result<Self, LockError> {
        let dir = dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("contribs-pipeline");
        Self::acquire_in(&dir, pipeline_name)
    }

    /// Try to take the lock for `pipeline_name` under `dir`
    ///
    /// Non-blocking: a held lock returns `LockError::Locked` immediately.
    pub fn acquire_in(dir: &Path, pipeline_name: &str) -> Result<Self, LockError> {
        fs::create_dir_all(dir).map_err(LockError::CreateFailed)?;
        let path = lock_path_for(dir, pipeline_name);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(LockError::CreateFailed)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                info!("Acquired run lock: {}", path.display());
                Ok(RunLock { _file: file, path })
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Err(LockError::Locked(path)),
            Err(e) => Err(LockError::AcquireFailed(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        // closing the file releases the flock
        debug!("Releasing run lock: {}", self.path.display());
    }
}

impl std::fmt::Debug for RunLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunLock").field("path", &self.path).finish()
    }
}

/// Lock file for a pipeline name
///
/// Anything other than ASCII alphanumerics, `-` and `_` becomes `_`:
/// "Build contributions" -> `Build_contributions.lock`.
pub fn lock_path_for(dir: &Path, pipeline_name: &str) -> PathBuf {
    let stem: String = pipeline_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{}.lock", stem))
}
