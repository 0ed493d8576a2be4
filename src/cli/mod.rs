//! cli
//!
//! Command-line interface layer for luna.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Delegate to command handlers
//! - Does NOT touch `.luna` directly
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] and [`crate::diff`] modules. All repository state
//! changes flow through the [`SnapshotManager`](crate::engine::SnapshotManager).

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::engine;
use anyhow::Result;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
    };

    commands::dispatch(cli.command, &ctx)
}
