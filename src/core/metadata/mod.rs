//! core::metadata
//!
//! Repository metadata schema and storage.
//!
//! # Modules
//!
//! - [`schema`] - The metadata record and its JSON form
//! - [`store`] - Reading and atomically updating `.luna/metadata.json`
//!
//! # Example
//!
//! ```
//! use luna::core::metadata::schema::{parse_metadata, RepositoryMetadata};
//!
//! let meta = RepositoryMetadata::new("/repo", "alice");
//! let json = meta.to_json().unwrap();
//! let parsed = parse_metadata(&json).unwrap();
//! assert_eq!(parsed.path, "/repo");
//! ```

pub mod schema;
pub mod store;

pub use schema::{
    parse_metadata, HistoryEntry, MetadataError, RepositoryMetadata, VersionDetails,
};
pub use store::{MetadataStore, StoreError};
