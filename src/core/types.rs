//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`VersionId`] - Validated positive version identifier
//! - [`CurrentVersion`] - What the working tree currently represents
//! - [`Timestamp`] - Local wall-clock time in `ctime` layout
//!
//! # Validation
//!
//! These types enforce validity at construction time. A version id of `0`
//! or a non-numeric id cannot be represented.
//!
//! # Examples
//!
//! ```
//! use luna::core::types::{CurrentVersion, VersionId};
//!
//! let v = VersionId::new(3).unwrap();
//! assert_eq!(v.to_string(), "3");
//! assert_eq!(v.key(), "version 3");
//!
//! assert!(VersionId::parse("0").is_err());
//! assert!(VersionId::parse("notes.txt").is_err());
//!
//! let cur: CurrentVersion = "deleted".parse().unwrap();
//! assert_eq!(cur, CurrentVersion::Deleted);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix used for version keys inside `version_details`.
pub const VERSION_KEY_PREFIX: &str = "version ";

/// Sentinel stored in `cur_version` once the current version is deleted.
pub const DELETED_SENTINEL: &str = "deleted";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version id: {0}")]
    InvalidVersion(String),

    #[error("invalid version key: {0}")]
    InvalidVersionKey(String),

    #[error("invalid current version: {0}")]
    InvalidCurrentVersion(String),

    #[error("version counter exhausted at {0}")]
    CounterExhausted(u64),
}

/// A validated version identifier.
///
/// Version identifiers are consecutive positive integers assigned in
/// creation order and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId(u64);

impl VersionId {
    /// The first version ever assigned in a repository.
    pub const FIRST: VersionId = VersionId(1);

    /// Create a version id from a number.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersion` for `0`.
    pub fn new(n: u64) -> Result<Self, TypeError> {
        if n == 0 {
            return Err(TypeError::InvalidVersion("0".into()));
        }
        Ok(Self(n))
    }

    /// Parse a version id from user input.
    ///
    /// Only ASCII digits are accepted; signs, whitespace and `0` are rejected.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TypeError::InvalidVersion(s.to_string()));
        }
        let n: u64 = s
            .parse()
            .map_err(|_| TypeError::InvalidVersion(s.to_string()))?;
        Self::new(n)
    }

    /// Parse a `version_details` key of the form `"version <n>"`.
    pub fn from_key(key: &str) -> Result<Self, TypeError> {
        key.strip_prefix(VERSION_KEY_PREFIX)
            .and_then(|n| Self::parse(n).ok())
            .ok_or_else(|| TypeError::InvalidVersionKey(key.to_string()))
    }

    /// The `version_details` key for this version.
    pub fn key(&self) -> String {
        format!("{}{}", VERSION_KEY_PREFIX, self.0)
    }

    /// The numeric value.
    pub fn get(&self) -> u64 {
        self.0
    }

    /// The id following a `num_versions` counter.
    pub fn after(num_versions: u64) -> Result<VersionId, TypeError> {
        num_versions
            .checked_add(1)
            .map(VersionId)
            .ok_or(TypeError::CounterExhausted(num_versions))
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VersionId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// The version the working tree is believed to match.
///
/// Persisted as a string: `"0"`, `"<n>"`, or `"deleted"`. Older records may
/// hold the number `0`, which is accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StringOrNumber", into = "String")]
pub enum CurrentVersion {
    /// Repository initialized, nothing committed yet.
    Uncommitted,
    /// The tree corresponds to this retained version.
    Version(VersionId),
    /// The version that was current has been deleted.
    Deleted,
}

impl CurrentVersion {
    /// The current version id, if the tree corresponds to one.
    pub fn version(&self) -> Option<VersionId> {
        match self {
            CurrentVersion::Version(v) => Some(*v),
            _ => None,
        }
    }

    /// Check whether this refers to `version`.
    pub fn is(&self, version: VersionId) -> bool {
        self.version() == Some(version)
    }
}

impl fmt::Display for CurrentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurrentVersion::Uncommitted => write!(f, "0"),
            CurrentVersion::Version(v) => write!(f, "{}", v),
            CurrentVersion::Deleted => write!(f, "{}", DELETED_SENTINEL),
        }
    }
}

impl FromStr for CurrentVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" => Ok(CurrentVersion::Uncommitted),
            DELETED_SENTINEL => Ok(CurrentVersion::Deleted),
            other => VersionId::parse(other)
                .map(CurrentVersion::Version)
                .map_err(|_| TypeError::InvalidCurrentVersion(other.to_string())),
        }
    }
}

impl From<CurrentVersion> for String {
    fn from(cur: CurrentVersion) -> Self {
        cur.to_string()
    }
}

impl TryFrom<StringOrNumber> for CurrentVersion {
    type Error = TypeError;

    fn try_from(raw: StringOrNumber) -> Result<Self, Self::Error> {
        raw.into_string().parse()
    }
}

/// A JSON scalar that older records wrote either as a number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Number(u64),
    Text(String),
}

impl StringOrNumber {
    /// Normalize to the string form.
    pub fn into_string(self) -> String {
        match self {
            StringOrNumber::Number(n) => n.to_string(),
            StringOrNumber::Text(s) => s,
        }
    }
}

/// Local wall-clock timestamps in the `ctime` layout used by the record.
///
/// # Example
///
/// ```
/// use luna::core::types::Timestamp;
///
/// let now = Timestamp::now();
/// assert_eq!(now.as_str().split_whitespace().count(), 5);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timestamp(String);

impl Timestamp {
    /// `ctime` layout: `Fri Oct 16 07:33:00 2026`.
    pub const FORMAT: &'static str = "%a %b %e %H:%M:%S %Y";

    /// Timestamp for the current moment.
    pub fn now() -> Self {
        Self(chrono::Local::now().format(Self::FORMAT).to_string())
    }

    /// The formatted timestamp.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Timestamp> for String {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod version_id {
        use super::*;

        #[test]
        fn parse_accepts_positive_integers() {
            assert_eq!(VersionId::parse("1").unwrap().get(), 1);
            assert_eq!(VersionId::parse("42").unwrap().get(), 42);
        }

        #[test]
        fn parse_rejects_zero() {
            assert!(VersionId::parse("0").is_err());
            assert!(VersionId::new(0).is_err());
        }

        #[test]
        fn parse_rejects_non_digits() {
            assert!(VersionId::parse("").is_err());
            assert!(VersionId::parse("-").is_err());
            assert!(VersionId::parse("+3").is_err());
            assert!(VersionId::parse(" 3").is_err());
            assert!(VersionId::parse("notes.txt").is_err());
        }

        #[test]
        fn key_round_trip() {
            let v = VersionId::new(12).unwrap();
            assert_eq!(v.key(), "version 12");
            assert_eq!(VersionId::from_key("version 12").unwrap(), v);
        }

        #[test]
        fn from_key_rejects_malformed() {
            assert!(VersionId::from_key("12").is_err());
            assert!(VersionId::from_key("version").is_err());
            assert!(VersionId::from_key("version x").is_err());
            assert!(VersionId::from_key("version 0").is_err());
        }

        #[test]
        fn after_counter() {
            assert_eq!(VersionId::after(0).unwrap(), VersionId::FIRST);
            assert_eq!(VersionId::after(4).unwrap().get(), 5);
            assert!(matches!(
                VersionId::after(u64::MAX),
                Err(TypeError::CounterExhausted(u64::MAX))
            ));
        }

        #[test]
        fn ordering_is_numeric() {
            let mut ids: Vec<_> = ["10", "2", "1"]
                .iter()
                .map(|s| VersionId::parse(s).unwrap())
                .collect();
            ids.sort();
            let shown: Vec<_> = ids.iter().map(|v| v.to_string()).collect();
            assert_eq!(shown, vec!["1", "2", "10"]);
        }
    }

    mod current_version {
        use super::*;

        #[test]
        fn parse_all_states() {
            assert_eq!(
                "0".parse::<CurrentVersion>().unwrap(),
                CurrentVersion::Uncommitted
            );
            assert_eq!(
                "deleted".parse::<CurrentVersion>().unwrap(),
                CurrentVersion::Deleted
            );
            assert_eq!(
                "7".parse::<CurrentVersion>().unwrap(),
                CurrentVersion::Version(VersionId::new(7).unwrap())
            );
            assert!("seven".parse::<CurrentVersion>().is_err());
        }

        #[test]
        fn serializes_as_string() {
            let cur = CurrentVersion::Version(VersionId::new(3).unwrap());
            assert_eq!(serde_json::to_string(&cur).unwrap(), "\"3\"");
            assert_eq!(
                serde_json::to_string(&CurrentVersion::Deleted).unwrap(),
                "\"deleted\""
            );
        }

        #[test]
        fn deserializes_legacy_number() {
            let cur: CurrentVersion = serde_json::from_str("0").unwrap();
            assert_eq!(cur, CurrentVersion::Uncommitted);
            let cur: CurrentVersion = serde_json::from_str("2").unwrap();
            assert_eq!(cur.version().unwrap().get(), 2);
        }

        #[test]
        fn is_matches_only_same_version() {
            let v1 = VersionId::new(1).unwrap();
            let v2 = VersionId::new(2).unwrap();
            let cur = CurrentVersion::Version(v1);
            assert!(cur.is(v1));
            assert!(!cur.is(v2));
            assert!(!CurrentVersion::Deleted.is(v1));
        }
    }
}
