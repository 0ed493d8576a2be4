//! diff
//!
//! Comparison of snapshots with each other or with the working tree.
//!
//! # Modules
//!
//! - [`operands`] - Decides what to compare from loose positional tokens
//! - [`tree`] - Recursive structural comparison of two directories
//! - [`lines`] - Line diff with intra-line hints
//! - [`report`] - Result types and their rendering
//!
//! # Flow
//!
//! ```text
//! tokens --resolve--> Resolution --DiffEngine::run--> DiffReport --Display--> text
//! ```
//!
//! A file present on one side only is a report outcome, not an error.

pub mod lines;
pub mod operands;
pub mod report;
pub mod tree;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::metadata::RepositoryMetadata;
use crate::core::tree::TreeFilter;
use crate::core::types::{CurrentVersion, VersionId};
use crate::engine::snapshot::SnapshotManager;
use crate::engine::SnapshotError;
use lines::LineDiff;
use operands::Side;
use report::{DiffReport, FileComparison, FileDiff, TreeDiff, UniqueEntry};
use tree::DirComparison;

/// Errors from `luna diff`.
#[derive(Debug, Error)]
pub enum DiffError {
    /// A version operand is not a retained version.
    #[error("unknown version: {0}")]
    UnknownVersion(String),

    /// The left side defaulted to the current version and there is none.
    #[error("no current version to compare (current version is {0})")]
    NoCurrentVersion(CurrentVersion),

    /// The file exists on neither side.
    #[error("file not found in either side: {0}")]
    FileNotFound(String),

    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Runs comparisons for one repository.
pub struct DiffEngine<'a> {
    manager: &'a SnapshotManager,
    filter: TreeFilter,
    cutoff: f32,
}

impl<'a> DiffEngine<'a> {
    /// An engine using the manager's configured ignore list and cutoff.
    ///
    /// Configured `exclude` names are ignored too, since snapshots never
    /// contain them.
    pub fn new(manager: &'a SnapshotManager) -> Self {
        let config = manager.config();
        let mut names = config.diff_ignore();
        names.extend(config.exclude().iter().cloned());
        Self {
            manager,
            filter: TreeFilter::new(names),
            cutoff: config.hint_cutoff(),
        }
    }

    /// Compare according to the positional tokens and `--file` value.
    pub fn run(
        &self,
        a: Option<&str>,
        b: Option<&str>,
        file: Option<&str>,
    ) -> Result<DiffReport, DiffError> {
        let meta = self.manager.metadata()?;
        let resolution = operands::resolve(a, b, file, meta.cur_version)?;

        let left = self.side_dir(&meta, resolution.left)?;
        let right = self.side_dir(&meta, resolution.right)?;

        match resolution.file {
            Some(name) => self
                .compare_file(&name, (resolution.left, &left), (resolution.right, &right))
                .map(DiffReport::File),
            None => self
                .compare_trees((resolution.left, &left), (resolution.right, &right))
                .map(DiffReport::Tree),
        }
    }

    /// Whole-tree comparison of two directories.
    pub fn compare_trees(
        &self,
        (left, left_dir): (Side, &Path),
        (right, right_dir): (Side, &Path),
    ) -> Result<TreeDiff, DiffError> {
        let closure = DirComparison::compare(left_dir, right_dir, &self.filter)?;

        let mut differing = Vec::new();
        for rel in closure.differing_files() {
            let old = read_text(&left_dir.join(&rel))?;
            let new = read_text(&right_dir.join(&rel))?;
            differing.push(FileDiff {
                path: display(&rel),
                diff: LineDiff::compute_with_cutoff(&old, &new, self.cutoff),
            });
        }

        let left_only = closure
            .left_only_entries()
            .iter()
            .map(|rel| self.unique(left_dir, rel, true))
            .collect::<Result<Vec<_>, _>>()?;
        let right_only = closure
            .right_only_entries()
            .iter()
            .map(|rel| self.unique(right_dir, rel, false))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TreeDiff {
            left,
            right,
            closure,
            differing,
            left_only,
            right_only,
        })
    }

    /// Single-file comparison of `name` relative to both directories.
    pub fn compare_file(
        &self,
        name: &str,
        (left, left_dir): (Side, &Path),
        (right, right_dir): (Side, &Path),
    ) -> Result<FileComparison, DiffError> {
        let lpath = left_dir.join(name);
        let rpath = right_dir.join(name);

        match (lpath.is_file(), rpath.is_file()) {
            (true, true) => {
                let old = read_text(&lpath)?;
                let new = read_text(&rpath)?;
                Ok(FileComparison::Diff {
                    left,
                    right,
                    file: FileDiff {
                        path: name.to_string(),
                        diff: LineDiff::compute_with_cutoff(&old, &new, self.cutoff),
                    },
                })
            }
            (true, false) => Ok(FileComparison::Unique {
                side: left,
                entry: self.unique(left_dir, Path::new(name), true)?,
            }),
            (false, true) => Ok(FileComparison::Unique {
                side: right,
                entry: self.unique(right_dir, Path::new(name), false)?,
            }),
            (false, false) => Err(DiffError::FileNotFound(name.to_string())),
        }
    }

    fn side_dir(&self, meta: &RepositoryMetadata, side: Side) -> Result<PathBuf, DiffError> {
        match side {
            Side::Version { id, .. } => self.version_dir(meta, id),
            Side::WorkingTree => Ok(self.manager.root().to_path_buf()),
        }
    }

    fn version_dir(&self, meta: &RepositoryMetadata, id: VersionId) -> Result<PathBuf, DiffError> {
        if meta.has_version(id) {
            Ok(self.manager.paths().version_dir(id))
        } else {
            Err(DiffError::UnknownVersion(id.to_string()))
        }
    }

    /// A one-sided entry. Files list their content lines as removed (left)
    /// or added (right), with nothing shown for the missing side.
    fn unique(&self, dir: &Path, rel: &Path, left: bool) -> Result<UniqueEntry, DiffError> {
        let path = dir.join(rel);
        let diff = if path.is_file() {
            let content = read_text(&path)?;
            Some(if left {
                LineDiff::removal(&content)
            } else {
                LineDiff::addition(&content)
            })
        } else {
            None
        };
        Ok(UniqueEntry {
            path: display(rel),
            diff,
        })
    }
}

/// File contents decoded lossily as UTF-8.
fn read_text(path: &Path) -> Result<String, DiffError> {
    let bytes = fs::read(path).map_err(|source| DiffError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn display(rel: &Path) -> String {
    rel.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, DiffConfig, GlobalConfig, RepoConfig};
    use crate::ui::output::Verbosity;
    use tempfile::TempDir;

    fn manager_with(temp: &TempDir, repo: RepoConfig) -> SnapshotManager {
        let config = Config::from_parts(GlobalConfig::default(), Some(repo));
        SnapshotManager::new(temp.path().to_path_buf(), config, Verbosity::Quiet)
    }

    fn manager(temp: &TempDir) -> SnapshotManager {
        manager_with(
            temp,
            RepoConfig {
                user: Some("tester".to_string()),
                ..Default::default()
            },
        )
    }

    fn write(temp: &TempDir, rel: &str, content: &str) {
        let path = temp.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn tree(report: DiffReport) -> TreeDiff {
        match report {
            DiffReport::Tree(t) => t,
            other => panic!("expected tree report, got {:?}", other),
        }
    }

    fn file(report: DiffReport) -> FileComparison {
        match report {
            DiffReport::File(f) => f,
            other => panic!("expected file report, got {:?}", other),
        }
    }

    #[test]
    fn two_commits_one_added_line() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "notes.txt", "line1\n");
        m.commit("first").unwrap();
        write(&temp, "notes.txt", "line1\nline2\n");
        m.commit("second").unwrap();

        let report = tree(DiffEngine::new(&m).run(Some("1"), Some("2"), None).unwrap());

        assert_eq!(report.differing.len(), 1);
        assert_eq!(report.differing[0].path, "notes.txt");
        assert_eq!(report.added_lines(), 1);
        assert_eq!(report.removed_lines(), 0);
        assert!(report.left_only.is_empty());
        assert!(report.right_only.is_empty());
    }

    #[test]
    fn current_against_unchanged_working_tree_is_identical() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "a.txt", "same\n");
        write(&temp, "sub/b.txt", "also same\n");
        m.commit("first").unwrap();

        let report = tree(DiffEngine::new(&m).run(None, None, None).unwrap());

        assert!(report.is_identical());
        assert_eq!(report.added_lines() + report.removed_lines(), 0);
        assert!(report.to_string().starts_with(
            "Comparing version 1 (current version) and working tree"
        ));
    }

    #[test]
    fn unique_files_carry_their_content() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "old.txt", "gone\n");
        m.commit("first").unwrap();
        fs::remove_file(temp.path().join("old.txt")).unwrap();
        write(&temp, "new.txt", "fresh\n");
        fs::create_dir(temp.path().join("empty")).unwrap();

        let report = tree(DiffEngine::new(&m).run(None, None, None).unwrap());

        assert_eq!(report.left_only.len(), 1);
        let removed: Vec<_> = report.left_only[0].diff.as_ref().unwrap().removed().collect();
        assert_eq!(removed, vec!["gone"]);

        let names: Vec<_> = report.right_only.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(names, vec!["empty", "new.txt"]);
        assert!(report.right_only[0].diff.is_none());
        let fresh = report.right_only[1].diff.as_ref().unwrap();
        assert_eq!(fresh.to_string(), "+ fresh");
        assert_eq!(fresh.removed_count(), 0);
    }

    #[test]
    fn ignored_and_excluded_names_are_skipped() {
        let temp = TempDir::new().unwrap();
        let m = manager_with(
            &temp,
            RepoConfig {
                exclude: Some(vec!["target".to_string()]),
                diff: Some(DiffConfig {
                    ignore: Some(vec!["scratch".to_string()]),
                    hint_cutoff: None,
                }),
                ..Default::default()
            },
        );
        m.init().unwrap();
        write(&temp, "a.txt", "a");
        m.commit("first").unwrap();
        write(&temp, "target/out.bin", "o");
        write(&temp, "scratch", "s");

        let report = tree(DiffEngine::new(&m).run(None, None, None).unwrap());
        assert!(report.is_identical());
    }

    #[test]
    fn single_file_mode() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        write(&temp, "notes.txt", "a\n");
        m.commit("first").unwrap();
        write(&temp, "notes.txt", "a\nb\n");

        let cmp = file(DiffEngine::new(&m).run(Some("notes.txt"), None, None).unwrap());
        match cmp {
            FileComparison::Diff { file, right, .. } => {
                assert_eq!(right, Side::WorkingTree);
                assert_eq!(file.diff.added().collect::<Vec<_>>(), vec!["b"]);
            }
            other => panic!("expected diff, got {:?}", other),
        }
    }

    #[test]
    fn single_file_missing_on_one_side_is_unique() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();
        write(&temp, "later.txt", "x");

        let cmp = file(
            DiffEngine::new(&m)
                .run(Some("1"), None, Some("later.txt"))
                .unwrap(),
        );
        assert!(matches!(
            cmp,
            FileComparison::Unique {
                side: Side::WorkingTree,
                ..
            }
        ));
    }

    #[test]
    fn single_file_missing_on_both_sides_fails() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();
        m.commit("first").unwrap();

        let err = DiffEngine::new(&m)
            .run(Some("ghost.txt"), None, None)
            .unwrap_err();
        assert!(matches!(err, DiffError::FileNotFound(ref n) if n == "ghost.txt"));
    }

    #[test]
    fn unknown_and_missing_versions() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        m.init().unwrap();

        assert!(matches!(
            DiffEngine::new(&m).run(None, None, None),
            Err(DiffError::NoCurrentVersion(CurrentVersion::Uncommitted))
        ));

        m.commit("first").unwrap();
        assert!(matches!(
            DiffEngine::new(&m).run(Some("1"), Some("9"), None),
            Err(DiffError::UnknownVersion(ref v)) if v == "9"
        ));

        m.delete(VersionId::FIRST).unwrap();
        assert!(matches!(
            DiffEngine::new(&m).run(None, None, None),
            Err(DiffError::NoCurrentVersion(CurrentVersion::Deleted))
        ));
    }

    #[test]
    fn uninitialized_repository() {
        let temp = TempDir::new().unwrap();
        let m = manager(&temp);
        assert!(matches!(
            DiffEngine::new(&m).run(None, None, None),
            Err(DiffError::Snapshot(SnapshotError::RepositoryNotFound(_)))
        ));
    }
}
