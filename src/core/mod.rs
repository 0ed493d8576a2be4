//! core
//!
//! Core domain types, schemas, and operations for luna.
//!
//! # Modules
//!
//! - [`types`] - Strong types: VersionId, CurrentVersion, Timestamp
//! - [`paths`] - Centralized path routing for `.luna` storage
//! - [`metadata`] - Repository metadata schema and storage
//! - [`history`] - Append-only audit log
//! - [`ops`] - Repository locking
//! - [`tree`] - Filesystem primitives over working trees and snapshots
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid version references
//! - The metadata record is validated on every read and write
//! - Filesystem failures always carry the path they happened on

pub mod config;
pub mod history;
pub mod metadata;
pub mod ops;
pub mod paths;
pub mod tree;
pub mod types;
