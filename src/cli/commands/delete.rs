//! delete and discard commands - Remove one version, or the whole repository

use super::{open_manager, parse_version};
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Delete one version and its snapshot.
pub fn delete(ctx: &Context, version: &str) -> Result<()> {
    let version = parse_version(version)?;
    let manager = open_manager(ctx)?;
    let verbosity = ctx.verbosity();

    let outcome = manager.delete(version)?;
    output::success(format!("delete version {}", version), verbosity);
    if outcome.was_current {
        output::warn(
            "the current version was deleted; commit or reset to set a new one",
            verbosity,
        );
    }
    Ok(())
}

/// Remove `.luna` and every snapshot.
pub fn discard(ctx: &Context) -> Result<()> {
    let manager = open_manager(ctx)?;
    manager.discard()?;
    output::success(
        format!("discard luna repo at {}", manager.root().display()),
        ctx.verbosity(),
    );
    Ok(())
}
