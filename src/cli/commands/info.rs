//! info command - Show the metadata record, or one field of it

use super::open_manager;
use crate::engine::Context;
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the whole record, or one top-level field, as pretty JSON.
pub fn info(ctx: &Context, field: Option<&str>) -> Result<()> {
    let manager = open_manager(ctx)?;
    let value = match field {
        Some(key) => manager.info_field(key)?,
        None => manager.info()?,
    };
    let text = serde_json::to_string_pretty(&value).context("Failed to format record")?;
    output::print(text, ctx.verbosity());
    Ok(())
}
