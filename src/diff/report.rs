//! diff::report
//!
//! Diff results and their textual rendering.
//!
//! # Whole-tree layout
//!
//! ```text
//! Comparing <left> and <right>
//! -------------------Overall diff-------------------
//! <structural summary of every directory level>
//! -----------------Different files------------------
//! diff file <path> (<left> -> <right>)
//! <line diff>
//! --------------<left> unique files---------------
//! unique file <path> (only in <left>)
//! -------------<right> unique files---------------
//! unique file <path> (only in <right>)
//! ```
//!
//! Section titles are centered in a 50-column rule of `-`.

use std::fmt;
use std::path::Path;

use super::lines::LineDiff;
use super::operands::Side;
use super::tree::DirComparison;

/// Width of a section rule.
pub const RULE_WIDTH: usize = 50;

/// A section title centered in a rule of `-`.
pub fn section_title(title: &str) -> String {
    format!("{:-^width$}", title, width = RULE_WIDTH)
}

/// A file present on both sides with different contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub diff: LineDiff,
}

/// An entry present on one side only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueEntry {
    pub path: String,
    /// Content lines listed as removed (left) or added (right); `None` for
    /// directories and other non-files.
    pub diff: Option<LineDiff>,
}

/// Result of a whole-tree comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeDiff {
    pub left: Side,
    pub right: Side,
    pub closure: DirComparison,
    pub differing: Vec<FileDiff>,
    pub left_only: Vec<UniqueEntry>,
    pub right_only: Vec<UniqueEntry>,
}

impl TreeDiff {
    /// True when the two trees have the same structure and contents.
    pub fn is_identical(&self) -> bool {
        self.closure.is_identical()
    }

    /// Lines added across all differing files.
    pub fn added_lines(&self) -> usize {
        self.differing.iter().map(|f| f.diff.added_count()).sum()
    }

    /// Lines removed across all differing files.
    pub fn removed_lines(&self) -> usize {
        self.differing.iter().map(|f| f.diff.removed_count()).sum()
    }
}

/// Result of a single-file comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileComparison {
    /// Present on both sides.
    Diff {
        left: Side,
        right: Side,
        file: FileDiff,
    },
    /// Present on one side only.
    Unique { side: Side, entry: UniqueEntry },
}

/// What `luna diff` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffReport {
    Tree(TreeDiff),
    File(FileComparison),
}

impl fmt::Display for DiffReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffReport::Tree(tree) => tree.fmt(f),
            DiffReport::File(file) => file.fmt(f),
        }
    }
}

impl fmt::Display for TreeDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Comparing {} and {}", self.left, self.right)?;

        writeln!(f, "{}", section_title("Overall diff"))?;
        for level in self.closure.closure() {
            write_level(f, level, &self.left, &self.right)?;
        }

        writeln!(f, "{}", section_title("Different files"))?;
        for file in &self.differing {
            writeln!(
                f,
                "diff file {} ({} -> {})",
                file.path, self.left, self.right
            )?;
            writeln!(f, "{}", file.diff)?;
        }

        writeln!(f, "{}", section_title(&format!("{} unique files", self.left)))?;
        for entry in &self.left_only {
            write_unique(f, entry, &self.left)?;
        }

        write!(f, "{}", section_title(&format!("{} unique files", self.right)))?;
        for entry in &self.right_only {
            writeln!(f)?;
            write_unique_inline(f, entry, &self.right)?;
        }
        Ok(())
    }
}

impl fmt::Display for FileComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileComparison::Diff { left, right, file } => {
                writeln!(f, "diff file {} ({} -> {})", file.path, left, right)?;
                write!(f, "{}", file.diff)
            }
            FileComparison::Unique { side, entry } => write_unique_inline(f, entry, side),
        }
    }
}

/// One directory level of the structural summary.
fn write_level(
    f: &mut fmt::Formatter<'_>,
    level: &DirComparison,
    left: &Side,
    right: &Side,
) -> fmt::Result {
    writeln!(f, "diff {}", display_rel(&level.rel))?;
    let buckets = [
        (format!("Only in {}", left), &level.left_only),
        (format!("Only in {}", right), &level.right_only),
        ("Identical files".to_string(), &level.identical),
        ("Differing files".to_string(), &level.differing),
        ("Common subdirectories".to_string(), &level.common_dirs),
        ("Type mismatches".to_string(), &level.mismatched),
    ];
    for (label, names) in buckets {
        if !names.is_empty() {
            writeln!(f, "{}: {}", label, names.join(", "))?;
        }
    }
    Ok(())
}

fn write_unique(f: &mut fmt::Formatter<'_>, entry: &UniqueEntry, side: &Side) -> fmt::Result {
    write_unique_inline(f, entry, side)?;
    writeln!(f)
}

fn write_unique_inline(f: &mut fmt::Formatter<'_>, entry: &UniqueEntry, side: &Side) -> fmt::Result {
    write!(f, "unique file {} (only in {})", entry.path, side)?;
    if let Some(diff) = &entry.diff {
        write!(f, "\n{}", diff)?;
    }
    Ok(())
}

fn display_rel(rel: &Path) -> String {
    if rel.as_os_str().is_empty() {
        ".".to_string()
    } else {
        rel.display().to_string()
    }
}
