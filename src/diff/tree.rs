//! diff::tree
//!
//! Recursive structural comparison of two directories.
//!
//! Both directories are read level by level in lock-step. At each level
//! every entry lands in exactly one bucket:
//!
//! - only on the left / only on the right
//! - a common file, identical or differing by content
//! - a common directory (compared recursively)
//! - a type mismatch (file on one side, directory on the other, or an
//!   entry that cannot be stat'ed)
//!
//! Names are sorted within each bucket. Symlinks are followed.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::DiffError;
use crate::core::tree::TreeFilter;

/// Comparison of one directory level, plus its common subdirectories.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirComparison {
    /// Path relative to the compared roots (empty for the roots themselves)
    pub rel: PathBuf,
    pub left_only: Vec<String>,
    pub right_only: Vec<String>,
    pub identical: Vec<String>,
    pub differing: Vec<String>,
    pub common_dirs: Vec<String>,
    pub mismatched: Vec<String>,
    /// One entry per `common_dirs` name, same order
    pub subdirs: Vec<DirComparison>,
}

impl DirComparison {
    /// Compare `left` and `right` recursively, skipping filtered names.
    pub fn compare(left: &Path, right: &Path, filter: &TreeFilter) -> Result<Self, DiffError> {
        Self::compare_at(left, right, PathBuf::new(), filter)
    }

    fn compare_at(
        left: &Path,
        right: &Path,
        rel: PathBuf,
        filter: &TreeFilter,
    ) -> Result<Self, DiffError> {
        let mut lefts = list(left, filter)?;
        let rights = list(right, filter)?;
        let mut cmp = DirComparison {
            rel,
            ..Default::default()
        };

        for (name, rpath) in &rights {
            let Some(lpath) = lefts.remove(name) else {
                cmp.right_only.push(name.clone());
                continue;
            };

            match (fs::metadata(&lpath), fs::metadata(rpath)) {
                (Ok(lm), Ok(rm)) if lm.is_dir() && rm.is_dir() => {
                    let sub = Self::compare_at(&lpath, rpath, cmp.rel.join(name), filter)?;
                    cmp.common_dirs.push(name.clone());
                    cmp.subdirs.push(sub);
                }
                (Ok(lm), Ok(rm)) if lm.is_file() && rm.is_file() => {
                    if lm.len() == rm.len() && same_contents(&lpath, rpath)? {
                        cmp.identical.push(name.clone());
                    } else {
                        cmp.differing.push(name.clone());
                    }
                }
                _ => cmp.mismatched.push(name.clone()),
            }
        }
        cmp.left_only = lefts.into_keys().collect();

        Ok(cmp)
    }

    /// This level and every level below it, depth first.
    pub fn closure(&self) -> Vec<&DirComparison> {
        let mut out = vec![self];
        for sub in &self.subdirs {
            out.extend(sub.closure());
        }
        out
    }

    /// Relative paths of every differing file in the closure.
    pub fn differing_files(&self) -> Vec<PathBuf> {
        self.collect(|c| &c.differing)
    }

    /// Relative paths of every left-only entry in the closure.
    pub fn left_only_entries(&self) -> Vec<PathBuf> {
        self.collect(|c| &c.left_only)
    }

    /// Relative paths of every right-only entry in the closure.
    pub fn right_only_entries(&self) -> Vec<PathBuf> {
        self.collect(|c| &c.right_only)
    }

    /// True when nothing differs anywhere in the closure.
    pub fn is_identical(&self) -> bool {
        self.closure().iter().all(|c| {
            c.left_only.is_empty()
                && c.right_only.is_empty()
                && c.differing.is_empty()
                && c.mismatched.is_empty()
        })
    }

    fn collect(&self, bucket: impl Fn(&DirComparison) -> &Vec<String>) -> Vec<PathBuf> {
        self.closure()
            .into_iter()
            .flat_map(|c| bucket(c).iter().map(move |name| c.rel.join(name)))
            .collect()
    }
}

/// Sorted name -> path map of one directory level.
fn list(dir: &Path, filter: &TreeFilter) -> Result<BTreeMap<String, PathBuf>, DiffError> {
    let io_err = |source| DiffError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let name = entry.file_name();
        if filter.is_excluded(&name) {
            continue;
        }
        entries.insert(name.to_string_lossy().into_owned(), entry.path());
    }
    Ok(entries)
}

/// Byte comparison of two files of equal length.
fn same_contents(a: &Path, b: &Path) -> Result<bool, DiffError> {
    let open = |path: &Path| {
        File::open(path).map(BufReader::new).map_err(|source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        })
    };
    let mut ra = open(a)?;
    let mut rb = open(b)?;

    let mut buf_a = [0u8; 8192];
    let mut buf_b = [0u8; 8192];
    loop {
        let n = read_full(&mut ra, &mut buf_a, a)?;
        let m = read_full(&mut rb, &mut buf_b, b)?;
        if n != m || buf_a[..n] != buf_b[..m] {
            return Ok(false);
        }
        if n == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows; returns bytes read.
fn read_full(reader: &mut impl Read, buf: &mut [u8], path: &Path) -> Result<usize, DiffError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(DiffError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    }
    Ok(filled)
}
