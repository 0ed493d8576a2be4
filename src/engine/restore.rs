//! engine::restore
//!
//! Stage-then-swap replacement of the working tree by a snapshot.
//!
//! # Sequence
//!
//! 1. Copy the snapshot into `.luna/staging-restore-*`
//! 2. Rename excluded entries nested inside kept directories into the
//!    matching place in the staging tree
//! 3. Rename the current top-level entries into `.luna/staging-trash-*`
//! 4. Rename the staged entries into the root
//! 5. Remove both staging directories
//!
//! Nothing in the working tree is touched until step 1 has fully
//! succeeded. If a later step fails, completed renames are reversed in the
//! opposite order so the tree ends up as it was. Steps 2 to 4 are renames
//! within one filesystem, so they do not copy data.
//!
//! Entries matched by the [`TreeFilter`] (always `.luna`) survive at any
//! depth. Top-level ones are never moved. Nested ones travel with step 2,
//! so `sub/target` or a nested repository's `sub/.luna` ends up at the same
//! path after the restore, even when the snapshot has no `sub`. If the
//! snapshot holds a file where such an entry needs a parent directory, the
//! restore fails and nothing changes.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::paths::LunaPaths;
use crate::core::tree::{self, TreeError, TreeFilter};
use crate::ui::output::{self, Verbosity};

/// Replace the working tree contents with the contents of `snapshot`.
///
/// # Errors
///
/// Returns the first [`TreeError`] encountered. On error the working tree
/// has been rolled back to its prior contents.
pub fn restore_tree(
    paths: &LunaPaths,
    snapshot: &Path,
    filter: &TreeFilter,
    verbosity: Verbosity,
) -> Result<(), TreeError> {
    if !snapshot.is_dir() {
        return Err(TreeError {
            op: "restore",
            path: snapshot.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "snapshot directory missing"),
        });
    }

    let root = paths.root();
    let staging = paths.staging_dir("restore");

    output::debug(
        format!("staging {} into {}", snapshot.display(), staging.display()),
        verbosity,
    );
    if let Err(e) = tree::copy_tree(snapshot, &staging, filter) {
        discard(&staging, verbosity);
        return Err(e);
    }

    let trash = paths.staging_dir("trash");
    let swapped =
        tree::create_dir(&trash).and_then(|_| swap(root, &staging, &trash, filter, verbosity));

    discard(&staging, verbosity);
    if swapped.is_ok() || is_empty(&trash) {
        discard(&trash, verbosity);
    } else {
        output::warn(
            format!("entries that could not be rolled back are kept in {}", trash.display()),
            verbosity,
        );
    }
    swapped
}

fn is_empty(dir: &Path) -> bool {
    tree::top_level_entries(dir, &TreeFilter::metadata_only())
        .map(|names| names.is_empty())
        .unwrap_or(false)
}

/// Steps 2 to 4, with rollback.
fn swap(
    root: &Path,
    staging: &Path,
    trash: &Path,
    filter: &TreeFilter,
    verbosity: Verbosity,
) -> Result<(), TreeError> {
    let current = tree::top_level_entries(root, filter)?;
    let nested = tree::excluded_below(root, filter)?;

    if !nested.is_empty() {
        output::debug(
            format!("carrying {} nested excluded entries over", nested.len()),
            verbosity,
        );
    }
    if let Err((carried, e)) = carry(&nested, root, staging) {
        uncarry(&carried, staging, root, verbosity);
        return Err(e);
    }

    output::debug(
        format!("moving {} entries out of the working tree", current.len()),
        verbosity,
    );
    if let Err((moved, e)) = tree::move_entries(&current, root, trash) {
        undo(&moved, trash, root, verbosity);
        uncarry(&nested, staging, root, verbosity);
        return Err(e);
    }

    let staged = tree::top_level_entries(staging, &TreeFilter::metadata_only());
    let staged = match staged {
        Ok(names) => names,
        Err(e) => {
            undo(&current, trash, root, verbosity);
            uncarry(&nested, staging, root, verbosity);
            return Err(e);
        }
    };

    output::debug(
        format!("moving {} restored entries into place", staged.len()),
        verbosity,
    );
    if let Err((moved, e)) = tree::move_entries(&staged, staging, root) {
        undo(&moved, root, staging, verbosity);
        undo(&current, trash, root, verbosity);
        uncarry(&nested, staging, root, verbosity);
        return Err(e);
    }

    Ok(())
}

/// Rename each relative path from under `from` to the same place under
/// `to`, creating parent directories in `to` as needed.
///
/// On error, the paths already moved are returned alongside the error.
fn carry(rels: &[PathBuf], from: &Path, to: &Path) -> Result<(), (Vec<PathBuf>, TreeError)> {
    let mut moved = Vec::with_capacity(rels.len());
    for rel in rels {
        let dst = to.join(rel);
        let step = match dst.parent() {
            Some(parent) => tree::create_dir(parent),
            None => Ok(()),
        }
        .and_then(|_| tree::rename(&from.join(rel), &dst));
        if let Err(e) = step {
            return Err((moved, e));
        }
        moved.push(rel.clone());
    }
    Ok(())
}

/// Put carried entries back where they came from, newest first.
fn uncarry(rels: &[PathBuf], from: &Path, to: &Path, verbosity: Verbosity) {
    for rel in rels.iter().rev() {
        if let Err(e) = tree::rename(&from.join(rel), &to.join(rel)) {
            output::warn(
                format!(
                    "rollback incomplete, {} is still in {}: {}",
                    rel.display(),
                    from.display(),
                    e
                ),
                verbosity,
            );
        }
    }
}

/// Move `names` back from `from` to `to`. Failures are reported, not
/// propagated, so the caller's original error wins.
fn undo(names: &[OsString], from: &Path, to: &Path, verbosity: Verbosity) {
    if names.is_empty() {
        return;
    }
    output::debug(
        format!("rolling back {} entries into {}", names.len(), to.display()),
        verbosity,
    );
    if let Err((_, e)) = tree::move_entries(names, from, to) {
        output::warn(
            format!(
                "rollback incomplete, remaining entries are in {}: {}",
                from.display(),
                e
            ),
            verbosity,
        );
    }
}

/// Remove a staging directory if it exists.
fn discard(dir: &Path, verbosity: Verbosity) {
    if !dir.exists() {
        return;
    }
    output::debug(format!("removing {}", dir.display()), verbosity);
    if let Err(e) = tree::remove_dir(dir) {
        output::warn(format!("could not clean up staging area: {}", e), verbosity);
    }
}
