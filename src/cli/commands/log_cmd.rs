//! log, history and view commands - Read-only listings of the metadata record
//!
//! `log` prints one block per retained version:
//!
//! ```text
//! version 2 (current)
//!   creator: alice
//!   time:    2024-05-01 10:12:33
//!   message: second
//! ```

use super::{open_manager, parse_version};
use crate::core::metadata::VersionDetails;
use crate::core::types::VersionId;
use crate::engine::Context;
use crate::ui::output;
use anyhow::Result;

/// List retained versions, oldest first.
pub fn log(ctx: &Context) -> Result<()> {
    let manager = open_manager(ctx)?;
    let entries = manager.log()?;
    let verbosity = ctx.verbosity();

    if entries.is_empty() {
        output::print("no commits, empty log", verbosity);
        return Ok(());
    }

    let blocks: Vec<String> = entries
        .iter()
        .map(|e| format_details(e.version, &e.details, e.is_current))
        .collect();
    output::print(blocks.join("\n"), verbosity);
    Ok(())
}

/// Print the audit log, oldest first.
pub fn history(ctx: &Context) -> Result<()> {
    let manager = open_manager(ctx)?;
    let lines: Vec<String> = manager
        .history()?
        .iter()
        .map(|h| format!("{} | {} | {}", h.time, h.user, h.info))
        .collect();
    if !lines.is_empty() {
        output::print(output::format_list(&lines, ""), ctx.verbosity());
    }
    Ok(())
}

/// Show the details of one version.
pub fn view(ctx: &Context, version: &str) -> Result<()> {
    let version = parse_version(version)?;
    let manager = open_manager(ctx)?;
    let details = manager.view(version)?;
    let is_current = manager.metadata()?.cur_version.is(version);
    output::print(format_details(version, &details, is_current), ctx.verbosity());
    Ok(())
}

fn format_details(version: VersionId, details: &VersionDetails, is_current: bool) -> String {
    let marker = if is_current { " (current)" } else { "" };
    format!(
        "version {}{}\n  creator: {}\n  time:    {}\n  message: {}",
        version, marker, details.creator, details.time, details.message
    )
}
