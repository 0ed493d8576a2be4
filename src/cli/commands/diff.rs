//! diff command - Compare versions with each other or with the working tree

use super::open_manager;
use crate::diff::DiffEngine;
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// Resolve the operands and print the report.
pub fn diff(ctx: &Context, v1: Option<&str>, v2: Option<&str>, file: Option<&str>) -> Result<()> {
    let manager = open_manager(ctx)?;
    let report = DiffEngine::new(&manager).run(v1, v2, file)?;
    output::print(report, ctx.verbosity());
    Ok(())
}
