//! core::tree
//!
//! Native filesystem primitives over working trees and snapshots.
//!
//! # Operations
//!
//! - [`copy_tree`] - Recursive copy honoring a [`TreeFilter`]
//! - [`top_level_entries`] - Names directly under a directory
//! - [`move_entries`] - Rename a set of top-level entries into another directory
//! - [`excluded_below`] - Excluded entries nested inside kept directories
//! - [`remove_dir`] / [`remove_file`] - Deletion
//!
//! Every failure carries the operation and the path it failed on.
//!
//! # Filtering
//!
//! A [`TreeFilter`] excludes entries by file name at any depth. The
//! metadata directory is always excluded, so snapshots never contain
//! `.luna` and restores never touch it.

use std::collections::BTreeSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::core::paths::LUNA_DIR_NAME;

/// A failed filesystem primitive.
#[derive(Debug, Error)]
#[error("{op} failed for '{}': {source}", path.display())]
pub struct TreeError {
    /// What was being done (`copy`, `rename`, ...)
    pub op: &'static str,
    /// The path the operation failed on
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl TreeError {
    fn new(op: &'static str, path: &Path, source: std::io::Error) -> Self {
        Self {
            op,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Names excluded from walks, copies and moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeFilter {
    names: BTreeSet<OsString>,
}

impl TreeFilter {
    /// A filter excluding `.luna` plus the given names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut set: BTreeSet<OsString> = names
            .into_iter()
            .map(|n| n.as_ref().to_os_string())
            .collect();
        set.insert(OsString::from(LUNA_DIR_NAME));
        Self { names: set }
    }

    /// A filter excluding only `.luna`.
    pub fn metadata_only() -> Self {
        Self::new(std::iter::empty::<&str>())
    }

    /// Check whether an entry name is excluded.
    pub fn is_excluded(&self, name: &OsStr) -> bool {
        self.names.contains(name)
    }
}

impl Default for TreeFilter {
    fn default() -> Self {
        Self::metadata_only()
    }
}

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` is created if missing. Excluded entries are skipped at every
/// depth. Symlinks are recreated as symlinks on unix.
///
/// Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, filter: &TreeFilter) -> Result<u64, TreeError> {
    fs::create_dir_all(dst).map_err(|e| TreeError::new("create directory", dst, e))?;

    let walker = WalkDir::new(src)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !filter.is_excluded(e.file_name()));

    let mut files = 0;
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(src).to_path_buf();
            TreeError::new("walk", &path, e.into())
        })?;

        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| {
                TreeError::new(
                    "walk",
                    entry.path(),
                    std::io::Error::new(std::io::ErrorKind::Other, e),
                )
            })?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| TreeError::new("create directory", &target, e))?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
            files += 1;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| TreeError::new("copy", entry.path(), e))?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), TreeError> {
    let link = fs::read_link(src).map_err(|e| TreeError::new("read link", src, e))?;
    std::os::unix::fs::symlink(&link, dst).map_err(|e| TreeError::new("symlink", dst, e))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), TreeError> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| TreeError::new("copy", src, e))
}

/// Excluded entries strictly below the top level of `root`, as paths
/// relative to `root`, in walk order.
///
/// Excluded directories are not descended into, so a nested `.luna` is
/// reported once as a whole.
pub fn excluded_below(root: &Path, filter: &TreeFilter) -> Result<Vec<PathBuf>, TreeError> {
    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    let mut found = Vec::new();
    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            TreeError::new("walk", &path, e.into())
        })?;
        if !filter.is_excluded(entry.file_name()) {
            continue;
        }
        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }
        if entry.depth() > 1 {
            if let Ok(rel) = entry.path().strip_prefix(root) {
                found.push(rel.to_path_buf());
            }
        }
    }
    Ok(found)
}

/// Names directly under `dir` that the filter does not exclude, sorted.
pub fn top_level_entries(dir: &Path, filter: &TreeFilter) -> Result<Vec<OsString>, TreeError> {
    let read = fs::read_dir(dir).map_err(|e| TreeError::new("read directory", dir, e))?;

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| TreeError::new("read directory", dir, e))?;
        let name = entry.file_name();
        if !filter.is_excluded(&name) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Rename each named entry from `from` into `to`.
///
/// Stops at the first failure. On error, the names already moved are
/// returned alongside the error so the caller can undo them.
pub fn move_entries(
    names: &[OsString],
    from: &Path,
    to: &Path,
) -> Result<(), (Vec<OsString>, TreeError)> {
    let mut moved = Vec::with_capacity(names.len());
    for name in names {
        let src = from.join(name);
        let dst = to.join(name);
        if let Err(e) = fs::rename(&src, &dst) {
            return Err((moved, TreeError::new("rename", &src, e)));
        }
        moved.push(name.clone());
    }
    Ok(())
}

/// Recursively remove a directory.
pub fn remove_dir(dir: &Path) -> Result<(), TreeError> {
    fs::remove_dir_all(dir).map_err(|e| TreeError::new("remove", dir, e))
}

/// Remove a single file.
pub fn remove_file(path: &Path) -> Result<(), TreeError> {
    fs::remove_file(path).map_err(|e| TreeError::new("remove", path, e))
}

/// Create a directory and its parents.
pub fn create_dir(dir: &Path) -> Result<(), TreeError> {
    fs::create_dir_all(dir).map_err(|e| TreeError::new("create directory", dir, e))
}

/// Rename a single path.
pub fn rename(from: &Path, to: &Path) -> Result<(), TreeError> {
    fs::rename(from, to).map_err(|e| TreeError::new("rename", from, e))
}
