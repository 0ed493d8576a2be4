//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers do NOT touch `.luna` directly.

mod commit;
mod completion;
mod config_cmd;
mod delete;
mod diff;
mod info;
mod init;
mod log_cmd;
mod reset;

// Re-export command functions for testing and direct invocation
pub use commit::{commit, revise};
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use delete::{delete, discard};
pub use diff::diff;
pub use info::info;
pub use init::init;
pub use log_cmd::{history, log, view};
pub use reset::reset;

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::core::types::VersionId;
use crate::engine::{Context, SnapshotError, SnapshotManager};
use anyhow::{Context as _, Result};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        // Lifecycle
        Command::Init => init::init(ctx),
        Command::Commit { message } => commit::commit(ctx, &message),
        Command::Revise { version, message } => commit::revise(ctx, &version, &message),
        Command::Reset { version } => reset::reset(ctx, version.as_deref()),
        Command::Delete { version } => delete::delete(ctx, &version),
        Command::Discard => delete::discard(ctx),

        // Read-only
        Command::Log => log_cmd::log(ctx),
        Command::History => log_cmd::history(ctx),
        Command::View { version } => log_cmd::view(ctx, &version),
        Command::Info { field } => info::info(ctx, field.as_deref()),
        Command::Diff { v1, v2, file } => {
            diff::diff(ctx, v1.as_deref(), v2.as_deref(), file.as_deref())
        }

        // Setup
        Command::Config { global, action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Open the repository at the context root with its configuration.
pub(crate) fn open_manager(ctx: &Context) -> Result<SnapshotManager> {
    let root = ctx
        .root()
        .context("Failed to resolve working directory")?;
    let config = Config::load(Some(&root)).context("Failed to load config")?;
    Ok(SnapshotManager::new(root, config, ctx.verbosity()))
}

/// Parse a version argument. Anything that is not a valid id is an unknown
/// version.
pub(crate) fn parse_version(raw: &str) -> Result<VersionId, SnapshotError> {
    VersionId::parse(raw).map_err(|_| SnapshotError::UnknownVersion(raw.to_string()))
}
