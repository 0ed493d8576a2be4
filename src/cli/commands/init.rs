//! init command - Create a luna repository in the working directory

use super::open_manager;
use crate::engine::{Context, InitOutcome};
use crate::ui::output;
use anyhow::Result;

/// Create a luna repository.
///
/// Succeeds with a warning when the repository already exists.
pub fn init(ctx: &Context) -> Result<()> {
    let manager = open_manager(ctx)?;
    let path = manager.root().display().to_string();
    let verbosity = ctx.verbosity();

    match manager.init()? {
        InitOutcome::Created => {
            output::success(format!("init luna repo at {}", path), verbosity);
        }
        InitOutcome::AlreadyInitialized => {
            output::warn(format!("already a luna repo: {}", path), verbosity);
        }
    }

    Ok(())
}
