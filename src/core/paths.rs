//! core::paths
//!
//! Centralized path routing for luna storage locations.
//!
//! **Hard rule:** No code outside this module computes `*.join(".luna")`
//! paths. Everything goes through [`LunaPaths`].
//!
//! # Storage Layout
//!
//! All luna data lives under `<root>/.luna/`:
//! - `metadata.json` - The repository metadata record
//! - `versions/<n>/` - Full copy of the working tree at commit `n`
//! - `lock` - Exclusive lock file
//! - `config.toml` - Optional repository configuration
//! - `staging-*/` - Transient staging areas for commit and reset
//!
//! # Example
//!
//! ```
//! use luna::core::paths::LunaPaths;
//! use std::path::PathBuf;
//!
//! let paths = LunaPaths::new(PathBuf::from("/work/project"));
//!
//! assert_eq!(
//!     paths.metadata_path(),
//!     PathBuf::from("/work/project/.luna/metadata.json")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::VersionId;

/// Name of the metadata directory inside the working tree.
pub const LUNA_DIR_NAME: &str = ".luna";

/// Centralized path routing for a luna repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunaPaths {
    /// The working tree root (the directory being versioned).
    pub root: PathBuf,
}

impl LunaPaths {
    /// Create paths for a working tree root.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The working tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the metadata directory.
    ///
    /// ```
    /// use luna::core::paths::LunaPaths;
    /// use std::path::PathBuf;
    ///
    /// let paths = LunaPaths::new(PathBuf::from("/repo"));
    /// assert_eq!(paths.luna_dir(), PathBuf::from("/repo/.luna"));
    /// ```
    pub fn luna_dir(&self) -> PathBuf {
        self.root.join(LUNA_DIR_NAME)
    }

    /// Path to the metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        self.luna_dir().join("metadata.json")
    }

    /// Temp path used for atomic metadata writes.
    pub fn metadata_temp_path(&self) -> PathBuf {
        self.luna_dir().join("metadata.json.tmp")
    }

    /// Directory holding all snapshots.
    pub fn versions_dir(&self) -> PathBuf {
        self.luna_dir().join("versions")
    }

    /// Directory holding the snapshot for one version.
    pub fn version_dir(&self, version: VersionId) -> PathBuf {
        self.versions_dir().join(version.to_string())
    }

    /// Path to the repository lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.luna_dir().join("lock")
    }

    /// Path to the repository configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.luna_dir().join("config.toml")
    }

    /// A fresh staging directory path under `.luna`.
    ///
    /// Staging lives on the same filesystem as the working tree so that
    /// moving entries in and out of it is a rename.
    pub fn staging_dir(&self, purpose: &str) -> PathBuf {
        self.luna_dir()
            .join(format!("staging-{}-{}", purpose, uuid::Uuid::new_v4()))
    }
}
