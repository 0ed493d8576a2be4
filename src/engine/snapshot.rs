//! engine::snapshot
//!
//! The snapshot manager: repository lifecycle operations and read
//! projections over the metadata record and `versions/<n>` directories.
//!
//! # Mutations
//!
//! | operation | effect | history |
//! |---|---|---|
//! | `init` | create `.luna`, empty record | `init at <path>` |
//! | `commit` | copy tree into `versions/<k>` | `commit version k with message '..'` |
//! | `revise` | replace a stored message | `revise version k with message '..'` |
//! | `reset` | swap the tree for a snapshot | `reset to version k` |
//! | `delete` | drop a snapshot and its details | `delete version k` |
//! | `discard` | remove `.luna` entirely | none (the log is gone) |
//!
//! Every mutation except `init` first checks that the record exists, then
//! takes the [`RepoLock`]. Version arguments are validated before anything
//! on disk changes.
//!
//! # Example
//!
//! ```no_run
//! use luna::core::config::Config;
//! use luna::engine::SnapshotManager;
//! use luna::ui::output::Verbosity;
//! use std::path::PathBuf;
//!
//! let root = PathBuf::from("/work/project");
//! let config = Config::load(Some(root.as_path())).unwrap();
//! let manager = SnapshotManager::new(root, config, Verbosity::Normal);
//!
//! manager.init().unwrap();
//! let v = manager.commit("first").unwrap();
//! manager.reset(Some(v)).unwrap();
//! ```

use std::fmt::Display;
use std::path::{Path, PathBuf};

use super::restore;
use super::SnapshotError;
use crate::core::config::Config;
use crate::core::history::{info, HistoryLog};
use crate::core::metadata::{
    HistoryEntry, MetadataStore, RepositoryMetadata, StoreError, VersionDetails,
};
use crate::core::ops::RepoLock;
use crate::core::paths::LunaPaths;
use crate::core::tree;
use crate::core::types::{CurrentVersion, VersionId};
use crate::ui::output::{self, Verbosity};

/// Result of `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// A new repository was created.
    Created,
    /// A repository already existed; nothing was changed.
    AlreadyInitialized,
}

/// Result of `delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The deleted version was the current one; `cur_version` is now `deleted`.
    pub was_current: bool,
}

/// One row of `log`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub version: VersionId,
    pub details: VersionDetails,
    pub is_current: bool,
}

/// Lifecycle operations on one working tree.
#[derive(Debug)]
pub struct SnapshotManager {
    paths: LunaPaths,
    store: MetadataStore,
    config: Config,
    verbosity: Verbosity,
}

impl SnapshotManager {
    /// A manager for the working tree at `root`.
    pub fn new(root: PathBuf, config: Config, verbosity: Verbosity) -> Self {
        let paths = LunaPaths::new(root);
        let store = MetadataStore::new(paths.clone());
        Self {
            paths,
            store,
            config,
            verbosity,
        }
    }

    /// The working tree root.
    pub fn root(&self) -> &Path {
        self.paths.root()
    }

    /// Storage paths for this repository.
    pub fn paths(&self) -> &LunaPaths {
        &self.paths
    }

    /// The loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the working tree is a luna repository.
    pub fn is_initialized(&self) -> bool {
        self.store.exists()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Create the repository if it does not exist.
    pub fn init(&self) -> Result<InitOutcome, SnapshotError> {
        if self.store.exists() {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        tree::create_dir(&self.paths.versions_dir())?;
        self.trace("acquiring repository lock");
        let _lock = RepoLock::acquire(&self.paths)?;

        // Re-check under the lock.
        if self.store.exists() {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let path = self.root().display().to_string();
        let actor = self.config.actor();
        self.store
            .create(&RepositoryMetadata::new(path.as_str(), actor.as_str()))?;
        HistoryLog::new(&self.store, &actor).append(info::init(&path))?;

        Ok(InitOutcome::Created)
    }

    /// Snapshot the working tree as a new version.
    ///
    /// Duplicate content is allowed; every commit is a full copy.
    pub fn commit(&self, message: &str) -> Result<VersionId, SnapshotError> {
        let _lock = self.lock()?;
        let meta = self.store.read()?;
        let version = meta.next_version()?;

        let target = self.paths.version_dir(version);
        if target.exists() {
            return Err(SnapshotError::SnapshotExists(version));
        }

        let staging = self.paths.staging_dir("commit");
        self.trace(format!("copying working tree into {}", staging.display()));
        let copied = match tree::copy_tree(self.root(), &staging, &self.config.tree_filter()) {
            Ok(n) => n,
            Err(e) => {
                self.cleanup(&staging);
                return Err(e.into());
            }
        };
        self.trace(format!("copied {} files", copied));

        let placed = tree::create_dir(&self.paths.versions_dir())
            .and_then(|_| tree::rename(&staging, &target));
        if let Err(e) = placed {
            self.cleanup(&staging);
            return Err(e.into());
        }

        let actor = self.config.actor();
        let log = HistoryLog::new(&self.store, &actor);
        let updated = self.store.update(|meta| {
            meta.version_details
                .insert(version, VersionDetails::now(actor.as_str(), message));
            meta.num_versions = version.get();
            meta.cur_version = CurrentVersion::Version(version);
            log.record(meta, info::commit(version, message));
        });
        if let Err(e) = updated {
            self.cleanup(&target);
            return Err(e.into());
        }

        Ok(version)
    }

    /// Replace the message of an existing version. The snapshot is not touched.
    pub fn revise(&self, version: VersionId, message: &str) -> Result<(), SnapshotError> {
        let _lock = self.lock()?;
        self.require_version(&self.store.read()?, version)?;

        let actor = self.config.actor();
        let log = HistoryLog::new(&self.store, &actor);
        self.store.update(|meta| {
            if let Some(details) = meta.version_details.get_mut(&version) {
                details.message = message.to_string();
            }
            log.record(meta, info::revise(version, message));
        })?;
        Ok(())
    }

    /// Restore the working tree to a version (default: the current one).
    ///
    /// Destructive: uncommitted changes are lost. Excluded entries are left
    /// in place.
    pub fn reset(&self, version: Option<VersionId>) -> Result<VersionId, SnapshotError> {
        let _lock = self.lock()?;
        let meta = self.store.read()?;

        let version = match version {
            Some(v) => v,
            None => meta
                .cur_version
                .version()
                .ok_or_else(|| SnapshotError::UnknownVersion(meta.cur_version.to_string()))?,
        };
        self.require_version(&meta, version)?;

        restore::restore_tree(
            &self.paths,
            &self.paths.version_dir(version),
            &self.config.tree_filter(),
            self.verbosity,
        )?;

        let actor = self.config.actor();
        let log = HistoryLog::new(&self.store, &actor);
        self.store.update(|meta| {
            meta.cur_version = CurrentVersion::Version(version);
            log.record(meta, info::reset(version));
        })?;
        Ok(version)
    }

    /// Remove a version's snapshot and details.
    ///
    /// `num_versions` is unchanged, so the id is never reused.
    pub fn delete(&self, version: VersionId) -> Result<DeleteOutcome, SnapshotError> {
        let _lock = self.lock()?;
        let meta = self.store.read()?;
        self.require_version(&meta, version)?;
        let was_current = meta.cur_version.is(version);

        let dir = self.paths.version_dir(version);
        let doomed = self.paths.staging_dir("delete");
        let moved = dir.exists();
        if moved {
            self.trace(format!("moving {} to {}", dir.display(), doomed.display()));
            tree::rename(&dir, &doomed)?;
        }

        let actor = self.config.actor();
        let log = HistoryLog::new(&self.store, &actor);
        let updated = self.store.update(|meta| {
            meta.version_details.remove(&version);
            if meta.cur_version.is(version) {
                meta.cur_version = CurrentVersion::Deleted;
            }
            log.record(meta, info::delete(version));
        });
        if let Err(e) = updated {
            if moved {
                if let Err(undo) = tree::rename(&doomed, &dir) {
                    output::warn(
                        format!(
                            "snapshot of version {} left in {}: {}",
                            version,
                            doomed.display(),
                            undo
                        ),
                        self.verbosity,
                    );
                }
            }
            return Err(e.into());
        }

        if moved {
            self.trace(format!("removing {}", doomed.display()));
            if let Err(e) = tree::remove_dir(&doomed) {
                output::warn(format!("could not clean up staging area: {}", e), self.verbosity);
            }
        }

        Ok(DeleteOutcome { was_current })
    }

    /// Remove `.luna` and everything in it. No confirmation.
    ///
    /// The lock is released before the directory holding the lock file goes.
    pub fn discard(&self) -> Result<(), SnapshotError> {
        let lock = self.lock()?;
        let versions = self.paths.versions_dir();
        if versions.exists() {
            self.trace(format!("removing {}", versions.display()));
            tree::remove_dir(&versions)?;
        }
        tree::remove_file(&self.paths.metadata_path())?;
        lock.release()?;

        tree::remove_dir(&self.paths.luna_dir())?;
        Ok(())
    }

    // =========================================================================
    // Read projections
    // =========================================================================

    /// The whole metadata record.
    pub fn metadata(&self) -> Result<RepositoryMetadata, SnapshotError> {
        Ok(self.store.read()?)
    }

    /// Retained versions in ascending order.
    pub fn log(&self) -> Result<Vec<LogEntry>, SnapshotError> {
        let meta = self.store.read()?;
        Ok(meta
            .version_details
            .iter()
            .map(|(version, details)| LogEntry {
                version: *version,
                details: details.clone(),
                is_current: meta.cur_version.is(*version),
            })
            .collect())
    }

    /// The audit log, oldest first.
    pub fn history(&self) -> Result<Vec<HistoryEntry>, SnapshotError> {
        Ok(self.store.read()?.history)
    }

    /// The whole record as JSON.
    pub fn info(&self) -> Result<serde_json::Value, SnapshotError> {
        let meta = self.store.read()?;
        serde_json::to_value(&meta)
            .map_err(|e| SnapshotError::Store(StoreError::SerializeError(e.to_string())))
    }

    /// One top-level field of the record as JSON.
    pub fn info_field(&self, key: &str) -> Result<serde_json::Value, SnapshotError> {
        Ok(self.store.read_field(key)?)
    }

    /// Details of one retained version.
    pub fn view(&self, version: VersionId) -> Result<VersionDetails, SnapshotError> {
        let meta = self.store.read()?;
        meta.details(version)
            .cloned()
            .ok_or_else(|| SnapshotError::UnknownVersion(version.to_string()))
    }

    /// The snapshot directory of a retained version.
    pub fn snapshot_dir(&self, version: VersionId) -> Result<PathBuf, SnapshotError> {
        self.require_version(&self.store.read()?, version)?;
        Ok(self.paths.version_dir(version))
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Take the repository lock, failing first if there is no repository.
    fn lock(&self) -> Result<RepoLock, SnapshotError> {
        if !self.store.exists() {
            return Err(SnapshotError::RepositoryNotFound(self.root().to_path_buf()));
        }
        self.trace("acquiring repository lock");
        Ok(RepoLock::acquire(&self.paths)?)
    }

    fn require_version(
        &self,
        meta: &RepositoryMetadata,
        version: VersionId,
    ) -> Result<(), SnapshotError> {
        if meta.has_version(version) {
            Ok(())
        } else {
            Err(SnapshotError::UnknownVersion(version.to_string()))
        }
    }

    fn cleanup(&self, dir: &Path) {
        if dir.exists() {
            self.trace(format!("removing {}", dir.display()));
            if let Err(e) = tree::remove_dir(dir) {
                output::warn(format!("could not clean up: {}", e), self.verbosity);
            }
        }
    }

    fn trace(&self, message: impl Display) {
        output::debug(message, self.verbosity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{GlobalConfig, RepoConfig};
    use crate::core::ops::LockError;
    use std::fs;
    use tempfile::TempDir;

    fn manager(temp: &TempDir) -> SnapshotManager {
        let config = Config::from_parts(
            GlobalConfig::default(),
            Some(RepoConfig {
                user: Some("tester".to_string()),
                ..Default::default()
            }),
        );
        SnapshotManager::new(temp.path().to_path_buf(), config, Verbosity::Quiet)
    }

    fn v(n: u64) -> VersionId {
        VersionId::new(n).unwrap()
    }

    fn write(temp: &TempDir, rel: &str, content: &str) {
        let path = temp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn init_creates_empty_repository() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);

        assert_eq!(m.init().unwrap(), InitOutcome::Created);

        let meta = m.metadata().unwrap();
        assert_eq!(meta.num_versions, 0);
        assert_eq!(meta.cur_version, CurrentVersion::Uncommitted);
        assert_eq!(meta.creator, "tester");
        assert!(m.paths().versions_dir().is_dir());
        assert_eq!(meta.history.len(), 1);
        assert!(meta.history[0].info.starts_with("init at "));
    }

    #[test]
    fn init_twice_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();

        assert_eq!(m.init().unwrap(), InitOutcome::AlreadyInitialized);
        assert_eq!(m.history().unwrap().len(), 1);
    }

    #[test]
    fn commit_assigns_consecutive_ids() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");

        assert_eq!(m.commit("first").unwrap(), v(1));
        assert_eq!(m.commit("again").unwrap(), v(2));

        let meta = m.metadata().unwrap();
        assert_eq!(meta.num_versions, 2);
        assert_eq!(meta.cur_version, CurrentVersion::Version(v(2)));
        assert_eq!(meta.details(v(1)).unwrap().message, "first");
        assert_eq!(
            fs::read_to_string(m.paths().version_dir(v(2)).join("a.txt")).unwrap(),
            "one"
        );
        assert!(!m.paths().version_dir(v(1)).join(".luna").exists());
    }

    #[test]
    fn commit_honors_configured_exclusions() {
        let temp = TempDir::new().unwrap();
        let config = Config::from_parts(
            GlobalConfig::default(),
            Some(RepoConfig {
                exclude: Some(vec!["target".to_string()]),
                ..Default::default()
            }),
        );
        let m = SnapshotManager::new(temp.path().to_path_buf(), config, Verbosity::Quiet);
        m.init().unwrap();
        write(&temp, "src.txt", "s");
        write(&temp, "target/out.bin", "o");

        let version = m.commit("first").unwrap();
        let snapshot = m.paths().version_dir(version);
        assert!(snapshot.join("src.txt").exists());
        assert!(!snapshot.join("target").exists());
    }

    #[test]
    fn commit_refuses_occupied_snapshot_dir() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        fs::create_dir_all(m.paths().version_dir(v(1))).unwrap();

        assert!(matches!(
            m.commit("first"),
            Err(SnapshotError::SnapshotExists(_))
        ));
        assert_eq!(m.metadata().unwrap().num_versions, 0);
    }

    #[test]
    fn operations_require_repository() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);

        assert!(matches!(
            m.commit("x"),
            Err(SnapshotError::RepositoryNotFound(_))
        ));
        assert!(matches!(m.log(), Err(SnapshotError::RepositoryNotFound(_))));
        assert!(matches!(
            m.discard(),
            Err(SnapshotError::RepositoryNotFound(_))
        ));
        assert!(!m.paths().luna_dir().exists());
    }

    #[test]
    fn revise_updates_message_only() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");
        m.commit("first").unwrap();

        m.revise(v(1), "better").unwrap();

        assert_eq!(m.view(v(1)).unwrap().message, "better");
        assert_eq!(m.metadata().unwrap().num_versions, 1);
        let last = m.history().unwrap().pop().unwrap();
        assert_eq!(last.info, "revise version 1 with message 'better'");
    }

    #[test]
    fn revise_unknown_version_fails_without_history() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();

        assert!(matches!(
            m.revise(v(3), "x"),
            Err(SnapshotError::UnknownVersion(_))
        ));
        assert_eq!(m.history().unwrap().len(), 1);
    }

    #[test]
    fn reset_restores_tree_and_sets_current() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");
        m.commit("first").unwrap();
        write(&temp, "a.txt", "two");
        write(&temp, "b.txt", "new");
        m.commit("second").unwrap();

        assert_eq!(m.reset(Some(v(1))).unwrap(), v(1));

        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "one");
        assert!(!temp.path().join("b.txt").exists());
        assert_eq!(
            m.metadata().unwrap().cur_version,
            CurrentVersion::Version(v(1))
        );
    }

    #[test]
    fn reset_defaults_to_current_version() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");
        m.commit("first").unwrap();
        write(&temp, "a.txt", "scribble");

        assert_eq!(m.reset(None).unwrap(), v(1));
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "one");
    }

    #[test]
    fn reset_without_commits_is_unknown_version() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "keep");

        let err = m.reset(None).unwrap_err();
        assert!(matches!(err, SnapshotError::UnknownVersion(ref s) if s == "0"));
        assert!(temp.path().join("a.txt").exists());
    }

    #[test]
    fn delete_current_marks_deleted() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();
        m.commit("second").unwrap();

        let outcome = m.delete(v(2)).unwrap();

        assert!(outcome.was_current);
        let meta = m.metadata().unwrap();
        assert_eq!(meta.cur_version, CurrentVersion::Deleted);
        assert_eq!(meta.num_versions, 2);
        assert!(!meta.has_version(v(2)));
        assert!(!m.paths().version_dir(v(2)).exists());

        // ids are never reused
        assert_eq!(m.commit("third").unwrap(), v(3));
    }

    #[test]
    fn delete_non_current_keeps_current() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();
        m.commit("second").unwrap();

        let outcome = m.delete(v(1)).unwrap();

        assert!(!outcome.was_current);
        assert_eq!(
            m.metadata().unwrap().cur_version,
            CurrentVersion::Version(v(2))
        );
    }

    #[test]
    fn delete_unknown_changes_nothing() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();
        let before = m.metadata().unwrap();

        assert!(matches!(
            m.delete(v(7)),
            Err(SnapshotError::UnknownVersion(_))
        ));
        assert_eq!(m.metadata().unwrap(), before);
    }

    #[test]
    fn discard_removes_everything() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");
        m.commit("first").unwrap();

        m.discard().unwrap();

        assert!(!m.paths().luna_dir().exists());
        assert!(temp.path().join("a.txt").exists());
        assert!(!m.is_initialized());
    }

    #[test]
    fn failed_delete_keeps_snapshot_and_history() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "a");
        m.commit("first").unwrap();
        let history_before = m.history().unwrap();

        // the atomic write cannot create its temp file
        fs::create_dir_all(m.paths().metadata_temp_path()).unwrap();
        assert!(matches!(m.delete(v(1)), Err(SnapshotError::Store(_))));

        assert!(m.paths().version_dir(v(1)).join("a.txt").is_file());
        assert_eq!(m.history().unwrap(), history_before);
        assert!(m.view(v(1)).is_ok());
        let leftovers = fs::read_dir(m.paths().luna_dir())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with("staging-")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn mutations_fail_while_locked() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();

        let _held = RepoLock::acquire(m.paths()).unwrap();

        assert!(matches!(
            m.commit("blocked"),
            Err(SnapshotError::Lock(LockError::AlreadyLocked))
        ));
        // reads do not lock
        assert!(m.log().unwrap().is_empty());
    }

    #[test]
    fn log_marks_current() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();
        m.commit("second").unwrap();

        let log = m.log().unwrap();
        assert_eq!(log.len(), 2);
        assert!(!log[0].is_current);
        assert!(log[1].is_current);
        assert_eq!(log[1].details.creator, "tester");
    }

    #[test]
    fn info_and_fields() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();

        let all = m.info().unwrap();
        assert_eq!(all["num_versions"], "0");
        assert_eq!(m.info_field("cur_version").unwrap(), "0");
        assert!(matches!(
            m.info_field("nope"),
            Err(SnapshotError::Store(StoreError::UnknownField(_)))
        ));
    }

    #[test]
    fn view_unknown_version() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        assert!(matches!(
            m.view(v(1)),
            Err(SnapshotError::UnknownVersion(_))
        ));
        assert!(m.snapshot_dir(v(1)).is_err());
    }

    #[test]
    fn no_staging_left_behind() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "one");
        m.commit("first").unwrap();
        m.reset(Some(v(1))).unwrap();

        let leftovers: Vec<_> = fs::read_dir(m.paths().luna_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("staging-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
