//! core::history
//!
//! Append-only audit log embedded in the metadata record.
//!
//! Every mutating operation appends exactly one entry after its primary
//! effect has succeeded. Entries are never pruned.
//!
//! Operations that already rewrite the record use [`HistoryLog::record`]
//! inside their own update, so the change and its entry land in one write.

use crate::core::metadata::schema::{HistoryEntry, RepositoryMetadata};
use crate::core::metadata::store::{MetadataStore, StoreError};
use crate::core::types::{Timestamp, VersionId};

/// Writer for the `history` field.
#[derive(Debug)]
pub struct HistoryLog<'a> {
    store: &'a MetadataStore,
    user: &'a str,
}

impl<'a> HistoryLog<'a> {
    /// A log that records entries as `user`.
    pub fn new(store: &'a MetadataStore, user: &'a str) -> Self {
        Self { store, user }
    }

    /// Append one entry stamped with the current actor and time.
    pub fn append(&self, info: impl Into<String>) -> Result<(), StoreError> {
        let info = info.into();
        self.store.update(|meta| self.record(meta, info))
    }

    /// Push an entry onto a record that the caller is about to write.
    pub fn record(&self, meta: &mut RepositoryMetadata, info: impl Into<String>) {
        meta.history.push(HistoryEntry {
            user: self.user.to_string(),
            time: Timestamp::now().into(),
            info: info.into(),
        });
    }
}

/// Info strings for each mutating operation.
pub mod info {
    use super::VersionId;

    pub fn init(path: &str) -> String {
        format!("init at {}", path)
    }

    pub fn commit(version: VersionId, message: &str) -> String {
        format!("commit version {} with message '{}'", version, message)
    }

    pub fn revise(version: VersionId, message: &str) -> String {
        format!("revise version {} with message '{}'", version, message)
    }

    pub fn reset(version: VersionId) -> String {
        format!("reset to version {}", version)
    }

    pub fn delete(version: VersionId) -> String {
        format!("delete version {}", version)
    }
}
