//! engine
//!
//! Repository lifecycle: the state transitions that create, revise,
//! restore and delete versions.
//!
//! # Architecture
//!
//! ```text
//! Uninitialized -> Initialized(cur=0) -> Committed(cur=k) -> Committed(cur=deleted)
//! ```
//!
//! - [`snapshot`] - [`SnapshotManager`], one method per lifecycle operation
//! - [`restore`] - Stage-then-swap replacement of the working tree
//!
//! # Invariants
//!
//! - Every mutating operation holds the [`RepoLock`](crate::core::ops::RepoLock)
//!   for its whole read-modify-write sequence
//! - Every mutating operation appends exactly one history entry, after its
//!   primary effect succeeded
//! - Version ids are never reused

pub mod restore;
pub mod snapshot;

pub use snapshot::{DeleteOutcome, InitOutcome, SnapshotManager};

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::metadata::StoreError;
use crate::core::ops::LockError;
use crate::core::tree::TreeError;
use crate::core::types::{TypeError, VersionId};
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

impl Context {
    /// The repository root: `--cwd` if given, else the process directory.
    ///
    /// The root is canonicalized so that the recorded `path` is absolute.
    pub fn root(&self) -> std::io::Result<PathBuf> {
        let dir = match &self.cwd {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        dir.canonicalize()
    }

    /// Output verbosity for this invocation.
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }
}

/// Errors from lifecycle operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No metadata record at the root.
    #[error("not a luna directory: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    /// The version is not in `version_details` (never existed, deleted, or
    /// not a valid id).
    #[error("unknown version: {0}")]
    UnknownVersion(String),

    /// A commit found its target snapshot directory already occupied.
    #[error("snapshot directory for version {0} already exists")]
    SnapshotExists(VersionId),

    #[error(transparent)]
    Store(StoreError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl From<StoreError> for SnapshotError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => SnapshotError::RepositoryNotFound(path),
            other => SnapshotError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn context_root_uses_cwd_override() {
        let temp = TempDir::new().unwrap();
        let ctx = Context {
            cwd: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        assert_eq!(ctx.root().unwrap(), temp.path().canonicalize().unwrap());
    }

    #[test]
    fn context_root_missing_dir_fails() {
        let ctx = Context {
            cwd: Some(PathBuf::from("/definitely/not/here")),
            ..Default::default()
        };
        assert!(ctx.root().is_err());
    }

    #[test]
    fn context_verbosity() {
        let ctx = Context {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(ctx.verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn store_not_found_maps_to_repository_not_found() {
        let err: SnapshotError = StoreError::NotFound(PathBuf::from("/x")).into();
        assert!(matches!(err, SnapshotError::RepositoryNotFound(_)));
        assert_eq!(err.to_string(), "not a luna directory: /x");

        let err: SnapshotError = StoreError::UnknownField("f".into()).into();
        assert!(matches!(err, SnapshotError::Store(_)));
    }
}
