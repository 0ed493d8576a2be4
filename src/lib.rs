//! Luna - local full-copy snapshots of a working directory
//!
//! Luna records the state of one directory tree as numbered versions kept
//! under `.luna/` in that same directory. It can restore the tree to any
//! retained version and compare versions with each other or with the live
//! tree.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates)
//! - [`engine`] - Repository lifecycle: init, commit, revise, reset, delete, discard
//! - [`diff`] - Operand resolution, tree comparison and line diffs
//! - [`core`] - Domain types, metadata record, config, locking and filesystem primitives
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. Version ids are assigned consecutively and never reused
//! 2. The metadata record is replaced atomically, never edited in place
//! 3. Mutations are serialized by an advisory lock on `.luna/lock`
//! 4. `reset` never leaves a half-restored tree behind

pub mod cli;
pub mod core;
pub mod diff;
pub mod engine;
pub mod ui;
