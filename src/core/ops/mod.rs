//! core::ops
//!
//! Operation locking.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive repository lock
//!
//! # Architecture
//!
//! Every mutating command:
//! 1. Checks the repository exists
//! 2. Acquires the exclusive repo lock
//! 3. Performs its filesystem effect and metadata update
//! 4. Appends exactly one history entry
//! 5. Releases the lock on drop

pub mod lock;

pub use lock::{LockError, RepoLock};
