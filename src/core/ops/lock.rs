//! core::ops::lock
//!
//! Advisory lock on `.luna/lock`, held by every mutating operation.
//!
//! Acquisition never blocks and never creates `.luna/`, so an
//! uninitialized tree cannot be locked. The guard unlocks when dropped.
//! [`RepoLock::release`] unlocks early and reports failures, which
//! `discard` needs before it removes the lock file itself.

use std::fs::{File, OpenOptions};
use std::path::PathBuf;

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::LunaPaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the lock.
    #[error("repository is locked by another luna process")]
    AlreadyLocked,

    /// The lock file could not be opened, usually because `.luna/` is gone.
    #[error("cannot open lock file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS refused the lock for a reason other than contention.
    #[error("failed to acquire lock: {0}")]
    Acquire(#[source] std::io::Error),

    #[error("failed to release lock: {0}")]
    Release(#[source] std::io::Error),
}

/// Guard for the repository lock.
#[derive(Debug)]
pub struct RepoLock {
    file: Option<File>,
}

impl RepoLock {
    /// Take the lock or fail immediately.
    ///
    /// # Errors
    ///
    /// [`LockError::AlreadyLocked`] when another guard holds it, and
    /// [`LockError::Open`] when `.luna/` does not exist.
    pub fn acquire(paths: &LunaPaths) -> Result<Self, LockError> {
        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open { path, source })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file: Some(file) }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::AlreadyLocked),
            Err(e) => Err(LockError::Acquire(e)),
        }
    }

    /// Unlock now and close the lock file.
    pub fn release(mut self) -> Result<(), LockError> {
        match self.file.take() {
            Some(file) => file.unlock().map_err(LockError::Release),
            None => Ok(()),
        }
    }
}

impl Drop for RepoLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn luna_dir() -> (TempDir, LunaPaths) {
        let temp = TempDir::new().unwrap();
        let paths = LunaPaths::new(temp.path().to_path_buf());
        std::fs::create_dir_all(paths.luna_dir()).unwrap();
        (temp, paths)
    }

    #[test]
    fn second_guard_is_refused() {
        let (_temp, paths) = luna_dir();
        let _held = RepoLock::acquire(&paths).unwrap();
        assert!(paths.lock_path().is_file());
        assert!(matches!(
            RepoLock::acquire(&paths),
            Err(LockError::AlreadyLocked)
        ));
    }

    #[test]
    fn drop_and_release_both_unlock() {
        let (_temp, paths) = luna_dir();
        drop(RepoLock::acquire(&paths).unwrap());
        let lock = RepoLock::acquire(&paths).unwrap();
        lock.release().unwrap();
        RepoLock::acquire(&paths).unwrap();
    }

    #[test]
    fn missing_luna_dir_is_not_created() {
        let temp = TempDir::new().unwrap();
        let paths = LunaPaths::new(temp.path().to_path_buf());

        let err = RepoLock::acquire(&paths).unwrap_err();
        assert!(matches!(err, LockError::Open { .. }));
        assert!(err.to_string().contains("lock"));
        assert!(!paths.luna_dir().exists());
    }
}
