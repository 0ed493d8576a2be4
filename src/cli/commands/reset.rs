//! reset command - Restore the working tree to a version

use super::{open_manager, parse_version};
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Restore the working tree to `version`, or to the current version.
pub fn reset(ctx: &Context, version: Option<&str>) -> Result<()> {
    let version = version.map(parse_version).transpose()?;
    let manager = open_manager(ctx)?;
    let restored = manager.reset(version)?;
    output::success(format!("reset to version {}", restored), ctx.verbosity());
    Ok(())
}
