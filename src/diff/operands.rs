//! diff::operands
//!
//! Deciding what `luna diff` compares.
//!
//! # Tokens
//!
//! Each positional argument is one of:
//! - absent
//! - the placeholder `-` (stands for the default of its slot)
//! - numeric: all ASCII digits, a version reference
//! - a name: anything else, a file name
//!
//! # Rules
//!
//! 1. Left side: the current version, unless the first token is numeric.
//! 2. A name in the first slot selects single-file mode with that name.
//! 3. Right side: the working tree, unless the second token is numeric.
//! 4. Otherwise a name in the second slot is the file, but only when the
//!    first slot held a version reference (numeric or `-`).
//! 5. Otherwise the `--file` value, if any.
//!
//! Rule 4 means `luna diff notes.txt` and `luna diff 1 notes.txt` both
//! compare one file, while `luna diff` with an absent first slot never
//! reads a file name from the second slot.

use std::fmt;

use super::DiffError;
use crate::core::types::{CurrentVersion, VersionId};

/// The placeholder token.
pub const PLACEHOLDER: &str = "-";

/// A classified positional argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Absent,
    Placeholder,
    Numeric(String),
    Name(String),
}

impl Token {
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            None => Token::Absent,
            Some(PLACEHOLDER) => Token::Placeholder,
            Some(s) if !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit()) => {
                Token::Numeric(s.to_string())
            }
            Some(s) => Token::Name(s.to_string()),
        }
    }

    /// Numeric, or the placeholder standing in for a version.
    fn is_version_ref(&self) -> bool {
        matches!(self, Token::Numeric(_) | Token::Placeholder)
    }

    fn name(&self) -> Option<&str> {
        match self {
            Token::Name(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// One side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// A stored snapshot. `current` is set when it was chosen as the default.
    Version { id: VersionId, current: bool },
    /// The live working tree.
    WorkingTree,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Version { id, current: true } => write!(f, "version {} (current version)", id),
            Side::Version { id, current: false } => write!(f, "version {}", id),
            Side::WorkingTree => f.write_str("working tree"),
        }
    }
}

/// The resolved comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub left: Side,
    pub right: Side,
    /// Single-file mode when set.
    pub file: Option<String>,
}

/// Resolve positional arguments `a`, `b` and the explicit `--file` value.
///
/// # Errors
///
/// - [`DiffError::NoCurrentVersion`] when the left side defaults to the
///   current version and there is none
/// - [`DiffError::UnknownVersion`] when a numeric token is not a valid id
pub fn resolve(
    a: Option<&str>,
    b: Option<&str>,
    file: Option<&str>,
    current: CurrentVersion,
) -> Result<Resolution, DiffError> {
    let a = Token::classify(a);
    let b = Token::classify(b);

    let left = match &a {
        Token::Numeric(n) => Side::Version {
            id: parse_version(n)?,
            current: false,
        },
        _ => Side::Version {
            id: current
                .version()
                .ok_or(DiffError::NoCurrentVersion(current))?,
            current: true,
        },
    };

    let right = match &b {
        Token::Numeric(n) => Side::Version {
            id: parse_version(n)?,
            current: false,
        },
        _ => Side::WorkingTree,
    };

    let file = match (a.name(), b.name()) {
        (Some(name), _) => Some(name.to_string()),
        (None, Some(name)) if a.is_version_ref() => Some(name.to_string()),
        _ => file.map(str::to_string),
    };

    Ok(Resolution { left, right, file })
}

fn parse_version(raw: &str) -> Result<VersionId, DiffError> {
    VersionId::parse(raw).map_err(|_| DiffError::UnknownVersion(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(n: u64) -> VersionId {
        VersionId::new(n).unwrap()
    }

    fn cur(n: u64) -> CurrentVersion {
        CurrentVersion::Version(v(n))
    }

    fn current(n: u64) -> Side {
        Side::Version {
            id: v(n),
            current: true,
        }
    }

    fn version(n: u64) -> Side {
        Side::Version {
            id: v(n),
            current: false,
        }
    }

    #[test]
    fn classify_tokens() {
        assert_eq!(Token::classify(None), Token::Absent);
        assert_eq!(Token::classify(Some("-")), Token::Placeholder);
        assert_eq!(Token::classify(Some("12")), Token::Numeric("12".into()));
        assert_eq!(Token::classify(Some("1a")), Token::Name("1a".into()));
        assert_eq!(Token::classify(Some("")), Token::Name("".into()));
    }

    #[test]
    fn no_arguments_compares_current_with_working_tree() {
        let r = resolve(None, None, None, cur(3)).unwrap();
        assert_eq!(r.left, current(3));
        assert_eq!(r.right, Side::WorkingTree);
        assert_eq!(r.file, None);
    }

    #[test]
    fn two_versions() {
        let r = resolve(Some("1"), Some("2"), None, cur(2)).unwrap();
        assert_eq!(r.left, version(1));
        assert_eq!(r.right, version(2));
        assert_eq!(r.file, None);
    }

    #[test]
    fn placeholder_first_slot_means_current() {
        let r = resolve(Some("-"), Some("2"), None, cur(1)).unwrap();
        assert_eq!(r.left, current(1));
        assert_eq!(r.right, version(2));
    }

    #[test]
    fn name_in_first_slot_is_file() {
        let r = resolve(Some("notes.txt"), None, None, cur(1)).unwrap();
        assert_eq!(r.left, current(1));
        assert_eq!(r.right, Side::WorkingTree);
        assert_eq!(r.file.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn name_in_second_slot_after_version_is_file() {
        let r = resolve(Some("1"), Some("notes.txt"), None, cur(2)).unwrap();
        assert_eq!(r.left, version(1));
        assert_eq!(r.right, Side::WorkingTree);
        assert_eq!(r.file.as_deref(), Some("notes.txt"));

        let r = resolve(Some("-"), Some("notes.txt"), None, cur(2)).unwrap();
        assert_eq!(r.left, current(2));
        assert_eq!(r.file.as_deref(), Some("notes.txt"));
    }

    #[test]
    fn name_in_second_slot_without_first_is_not_file() {
        let r = resolve(None, Some("notes.txt"), None, cur(2)).unwrap();
        assert_eq!(r.file, None);
        assert_eq!(r.right, Side::WorkingTree);
    }

    #[test]
    fn first_slot_name_wins_over_second_and_explicit() {
        let r = resolve(Some("a.txt"), Some("b.txt"), Some("c.txt"), cur(1)).unwrap();
        assert_eq!(r.file.as_deref(), Some("a.txt"));
    }

    #[test]
    fn explicit_file_used_otherwise() {
        let r = resolve(Some("1"), Some("2"), Some("c.txt"), cur(2)).unwrap();
        assert_eq!(r.file.as_deref(), Some("c.txt"));

        let r = resolve(None, Some("b.txt"), Some("c.txt"), cur(2)).unwrap();
        assert_eq!(r.file.as_deref(), Some("c.txt"));
    }

    #[test]
    fn no_current_version() {
        for state in [CurrentVersion::Uncommitted, CurrentVersion::Deleted] {
            assert!(matches!(
                resolve(None, None, None, state),
                Err(DiffError::NoCurrentVersion(_))
            ));
        }
        // an explicit left version does not need a current one
        assert!(resolve(Some("1"), None, None, CurrentVersion::Deleted).is_ok());
    }

    #[test]
    fn zero_is_unknown_version() {
        assert!(matches!(
            resolve(Some("0"), None, None, cur(1)),
            Err(DiffError::UnknownVersion(ref s)) if s == "0"
        ));
    }

    #[test]
    fn side_labels() {
        assert_eq!(current(2).to_string(), "version 2 (current version)");
        assert_eq!(version(2).to_string(), "version 2");
        assert_eq!(Side::WorkingTree.to_string(), "working tree");
    }
}
