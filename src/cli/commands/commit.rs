//! commit and revise commands - Record versions and edit their messages

use super::{open_manager, parse_version};
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Snapshot the working tree as a new version.
pub fn commit(ctx: &Context, message: &str) -> Result<()> {
    let manager = open_manager(ctx)?;
    let version = manager.commit(message)?;
    output::success(format!("commit version {}", version), ctx.verbosity());
    Ok(())
}

/// Replace the message of an existing version.
pub fn revise(ctx: &Context, version: &str, message: &str) -> Result<()> {
    let version = parse_version(version)?;
    let manager = open_manager(ctx)?;
    manager.revise(version, message)?;
    output::success(format!("revise version {}", version), ctx.verbosity());
    Ok(())
}
