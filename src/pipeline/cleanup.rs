use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use miette::miette;
use tracing::{debug, warn};

use crate::{
    io::{remove_dir_if_empty, remove_file_if_exists},
    result::{ErrorKind, Failure},
    utils::MutexUtils,
};

/// Outcome of a cleanup pass
#[derive(Debug, Default)]
pub struct CleanupOutcome {
    pub removed: usize,
    pub failures: Vec<Failure>,
}

/// Every temporary clip file of a run, along with the directory holding them.
///
/// Paths are registered *before* being written to, so that a clip is removed
/// even if its extraction failed midway.
/// If [`TempClips::cleanup`] has not been called when the set is dropped,
/// the cleanup is done at that point and its failures are only logged.
#[derive(Debug)]
pub struct TempClips {
    dir: PathBuf,
    paths: Mutex<Vec<PathBuf>>,
    cleaned: AtomicBool,
}

impl TempClips {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: Mutex::new(Vec::new()),
            cleaned: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Register a temporary file, making sure it will be removed
    pub fn register(&self, path: PathBuf) {
        self.paths.with_lock(|mut paths| paths.push(path));
    }

    /// Number of registered temporary files
    pub fn len(&self) -> usize {
        self.paths.with_lock(|paths| paths.len())
    }

    /// Remove every registered file, then the directory if empty.
    ///
    /// Can be called multiple times, already removed files are not errors.
    pub fn cleanup(&self) -> CleanupOutcome {
        let paths = self.paths.with_lock(|paths| paths.clone());
        let outcome = cleanup(&paths, &self.dir);
        self.cleaned.store(true, Ordering::Release);
        outcome
    }
}

impl Drop for TempClips {
    fn drop(&mut self) {
        if self.cleaned.load(Ordering::Acquire) {
            return;
        }

        debug!("Temporary clips dropped before being cleaned up, cleaning them now");
        for failure in self.cleanup().failures {
            warn!("{failure}");
        }
    }
}

/// Best-effort removal of the files and of the directory if it is left empty.
///
/// Every failure is reported individually and does not stop the other removals.
pub fn cleanup(paths: &[PathBuf], dir: &Path) -> CleanupOutcome {
    let mut outcome = CleanupOutcome::default();

    for path in paths {
        match remove_file_if_exists(path) {
            Ok(true) => {
                debug!("Removed temporary file {}", path.display());
                outcome.removed += 1;
            }
            Ok(false) => {}
            Err(err) => outcome.failures.push(Failure::new(
                ErrorKind::CleanupFailure,
                path.display(),
                miette!("Could not remove temporary file: {err}"),
            )),
        }
    }

    match remove_dir_if_empty(dir) {
        Ok(true) => debug!("Removed temporary directory {}", dir.display()),
        Ok(false) => {}
        Err(err) => outcome.failures.push(Failure::new(
            ErrorKind::CleanupFailure,
            dir.display(),
            miette!("Could not remove temporary directory: {err}"),
        )),
    }

    outcome
}
