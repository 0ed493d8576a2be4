//! core::metadata::store
//!
//! Metadata storage in `.luna/metadata.json`.
//!
//! # Architecture
//!
//! The store owns the single metadata record of a repository. Reads load
//! and validate the whole record; writes are read-modify-write updates that
//! only change what the caller touches. Callers that mutate hold the
//! [`RepoLock`](crate::core::ops::lock::RepoLock) around the update.
//!
//! # Atomic Writes
//!
//! The record is serialized to `metadata.json.tmp`, synced, and renamed
//! over `metadata.json`. A crash mid-write leaves either the old or the new
//! record, never a truncated one.
//!
//! # Example
//!
//! ```ignore
//! use luna::core::metadata::store::MetadataStore;
//! use luna::core::paths::LunaPaths;
//!
//! let store = MetadataStore::new(LunaPaths::new(root));
//!
//! let meta = store.read()?;
//! println!("{} versions", meta.num_versions);
//!
//! store.update(|meta| meta.path = "/new/root".into())?;
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{parse_metadata, MetadataError, RepositoryMetadata};
use crate::core::paths::LunaPaths;

/// Errors from metadata storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The metadata record does not exist.
    #[error("not a luna directory: {}", .0.display())]
    NotFound(PathBuf),

    /// `create` found an existing record.
    #[error("metadata already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    /// A requested top-level field is not in the record.
    #[error("unknown metadata field: {0}")]
    UnknownField(String),

    /// Failed to parse the record.
    #[error("failed to parse metadata: {0}")]
    ParseError(String),

    /// Failed to serialize the record.
    #[error("failed to serialize metadata: {0}")]
    SerializeError(String),

    /// Filesystem failure reading or writing the record.
    #[error("metadata i/o error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Metadata validation failed.
    #[error("metadata error: {0}")]
    MetadataError(#[from] MetadataError),
}

/// Metadata store backed by `.luna/metadata.json`.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    paths: LunaPaths,
}

impl MetadataStore {
    /// Create a store for the repository at `paths`.
    pub fn new(paths: LunaPaths) -> Self {
        Self { paths }
    }

    /// Paths of the repository this store belongs to.
    pub fn paths(&self) -> &LunaPaths {
        &self.paths
    }

    /// Check if the record exists (the repository is initialized).
    pub fn exists(&self) -> bool {
        self.paths.metadata_path().is_file()
    }

    /// Read the whole record.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the repository is not initialized
    /// - [`StoreError::MetadataError`] if the record is malformed
    pub fn read(&self) -> Result<RepositoryMetadata, StoreError> {
        let json = self.read_raw()?;
        Ok(parse_metadata(&json)?)
    }

    /// Read one top-level field as JSON.
    ///
    /// Field names are the on-disk names (`num_versions`, `history`, ...).
    pub fn read_field(&self, key: &str) -> Result<serde_json::Value, StoreError> {
        let json = self.read_raw()?;
        let mut value: serde_json::Value =
            serde_json::from_str(&json).map_err(|e| StoreError::ParseError(e.to_string()))?;

        value
            .as_object_mut()
            .and_then(|map| map.remove(key))
            .ok_or_else(|| StoreError::UnknownField(key.to_string()))
    }

    /// Write the initial record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyExists`] instead of overwriting.
    pub fn create(&self, meta: &RepositoryMetadata) -> Result<(), StoreError> {
        if self.exists() {
            return Err(StoreError::AlreadyExists(self.paths.metadata_path()));
        }
        self.write_atomic(meta)
    }

    /// Read-modify-write the record.
    ///
    /// The closure sees the current record; whatever it leaves unchanged,
    /// including fields unknown to this crate, is written back as it was.
    /// The updated record is validated before it is persisted.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the repository is not initialized
    /// - [`StoreError::MetadataError`] if the update breaks an invariant
    pub fn update<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut RepositoryMetadata) -> T,
    {
        let mut meta = self.read()?;
        let out = f(&mut meta);
        meta.validate()?;
        self.write_atomic(&meta)?;
        Ok(out)
    }

    fn read_raw(&self) -> Result<String, StoreError> {
        let path = self.paths.metadata_path();
        fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StoreError::NotFound(self.paths.root.clone()),
            _ => StoreError::Io { path, source: e },
        })
    }

    fn write_atomic(&self, meta: &RepositoryMetadata) -> Result<(), StoreError> {
        let json = meta
            .to_json()
            .map_err(|e| StoreError::SerializeError(e.to_string()))?;

        let temp_path = self.paths.metadata_temp_path();
        let mut file = fs::File::create(&temp_path).map_err(|e| io_error(&temp_path, e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| io_error(&temp_path, e))?;
        file.sync_all().map_err(|e| io_error(&temp_path, e))?;

        let path = self.paths.metadata_path();
        fs::rename(&temp_path, &path).map_err(|e| io_error(&path, e))?;
        Ok(())
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}
