//! core::metadata::schema
//!
//! The repository metadata record.
//!
//! # Schema Design
//!
//! The record is a single JSON object at `.luna/metadata.json`:
//!
//! ```json
//! {
//!   "create_time": "Fri Oct 16 07:33:00 2026",
//!   "creator": "alice",
//!   "path": "/home/alice/project",
//!   "num_versions": "2",
//!   "cur_version": "2",
//!   "version_details": {
//!     "version 1": { "creator": "alice", "time": "...", "msg": "first" },
//!     "version 2": { "creator": "alice", "time": "...", "msg": "second" }
//!   },
//!   "history": [ { "user": "alice", "time": "...", "info": "init at ..." } ]
//! }
//! ```
//!
//! Counters are written as strings. Older writers stored `num_versions` and
//! `cur_version` as numbers, so both forms are accepted on read. Top-level
//! fields this crate does not know about are carried through untouched.
//!
//! # Example
//!
//! ```
//! use luna::core::metadata::schema::{parse_metadata, RepositoryMetadata};
//!
//! let meta = RepositoryMetadata::new("/repo", "alice");
//! let json = serde_json::to_string(&meta).unwrap();
//! let parsed = parse_metadata(&json).unwrap();
//! assert_eq!(parsed.num_versions, 0);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{CurrentVersion, Timestamp, TypeError, VersionId};

/// Errors from metadata parsing.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to parse metadata: {0}")]
    ParseError(String),

    #[error("invalid metadata value: {0}")]
    InvalidValue(String),
}

/// Parse a metadata record and check its invariants.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or the record violates the
/// version invariants (see [`RepositoryMetadata::validate`]).
pub fn parse_metadata(json: &str) -> Result<RepositoryMetadata, MetadataError> {
    let meta: RepositoryMetadata =
        serde_json::from_str(json).map_err(|e| MetadataError::ParseError(e.to_string()))?;
    meta.validate()?;
    Ok(meta)
}

/// Details recorded for one version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionDetails {
    /// Who committed the version
    pub creator: String,

    /// When the version was committed
    pub time: String,

    /// Commit message (persisted as `msg`)
    #[serde(rename = "msg")]
    pub message: String,
}

impl VersionDetails {
    /// Details for a version committed now.
    pub fn now(creator: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            creator: creator.into(),
            time: Timestamp::now().into(),
            message: message.into(),
        }
    }
}

/// One audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryEntry {
    pub user: String,
    pub time: String,
    pub info: String,
}

/// The repository metadata record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepositoryMetadata {
    /// When `init` ran
    pub create_time: String,

    /// Who ran `init`
    pub creator: String,

    /// Absolute repository root
    pub path: String,

    /// Highest version id ever assigned
    #[serde(with = "counter")]
    pub num_versions: u64,

    /// What the working tree currently represents
    pub cur_version: CurrentVersion,

    /// Retained versions, keyed as `"version <n>"` on disk
    #[serde(with = "version_table", default)]
    pub version_details: BTreeMap<VersionId, VersionDetails>,

    /// Append-only audit log
    #[serde(default)]
    pub history: Vec<HistoryEntry>,

    /// Fields written by other tooling, preserved verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RepositoryMetadata {
    /// The initial record written by `init`.
    pub fn new(path: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            create_time: Timestamp::now().into(),
            creator: creator.into(),
            path: path.into(),
            num_versions: 0,
            cur_version: CurrentVersion::Uncommitted,
            version_details: BTreeMap::new(),
            history: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    /// Check the version invariants.
    ///
    /// - every `version_details` key is within `1..=num_versions`
    /// - `cur_version`, when it names a version, names a retained one
    pub fn validate(&self) -> Result<(), MetadataError> {
        if let Some((last, _)) = self.version_details.iter().next_back() {
            if last.get() > self.num_versions {
                return Err(MetadataError::InvalidValue(format!(
                    "version {} exceeds num_versions {}",
                    last, self.num_versions
                )));
            }
        }

        if let CurrentVersion::Version(v) = self.cur_version {
            if !self.version_details.contains_key(&v) {
                return Err(MetadataError::InvalidValue(format!(
                    "cur_version {} has no version details",
                    v
                )));
            }
        }

        Ok(())
    }

    /// Look up a retained version.
    pub fn details(&self, version: VersionId) -> Option<&VersionDetails> {
        self.version_details.get(&version)
    }

    /// Check whether a version is retained.
    pub fn has_version(&self, version: VersionId) -> bool {
        self.version_details.contains_key(&version)
    }

    /// The id the next commit will receive.
    pub fn next_version(&self) -> Result<VersionId, TypeError> {
        VersionId::after(self.num_versions)
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `num_versions`: written as a string, read from a string or a number.
mod counter {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::core::types::StringOrNumber;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let raw = StringOrNumber::deserialize(deserializer)?.into_string();
        raw.parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid counter: {}", raw)))
    }
}

/// `version_details`: a map keyed by `"version <n>"`.
mod version_table {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::VersionDetails;
    use crate::core::types::VersionId;

    pub fn serialize<S: Serializer>(
        table: &BTreeMap<VersionId, VersionDetails>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(table.iter().map(|(id, details)| (id.key(), details)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<VersionId, VersionDetails>, D::Error> {
        let raw = BTreeMap::<String, VersionDetails>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, details)| {
                VersionId::from_key(&key)
                    .map(|id| (id, details))
                    .map_err(serde::de::Error::custom)
            })
            .collect()
    }
}
