//! config command - Get, set, or list configuration values

use super::open_manager;
use crate::core::config::{Config, ConfigKey};
use crate::engine::{Context, SnapshotError};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Print the effective value of a key.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    let manager = open_manager(ctx)?;
    let value = key.effective(manager.config());
    if !value.is_empty() {
        println!("{}", value);
    }
    Ok(())
}

/// Set a key in repository config, or global config with `global`.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let key: ConfigKey = key.parse()?;
    let manager = open_manager(ctx)?;
    let config = manager.config();

    let path = if global {
        let mut global_config = config.global.clone();
        key.set_global(&mut global_config, value)?;
        Config::write_global(&global_config, config.global_config_loaded_from())
            .context("Failed to write global config")?
    } else {
        if !manager.is_initialized() {
            return Err(SnapshotError::RepositoryNotFound(manager.root().to_path_buf()).into());
        }
        let mut repo_config = config.repo.clone().unwrap_or_default();
        key.set_repo(&mut repo_config, value)?;
        Config::write_repo(manager.root(), &repo_config)
            .context("Failed to write repository config")?
    };

    output::success(format!("Set {} = {}", key, value), ctx.verbosity());
    output::debug(format!("wrote {}", path.display()), ctx.verbosity());
    Ok(())
}

/// Print every key with its effective value and where config was loaded from.
pub fn list(ctx: &Context) -> Result<()> {
    let manager = open_manager(ctx)?;
    let config = manager.config();

    println!("# Configuration");
    for key in ConfigKey::ALL {
        let value = key.effective(config);
        if value.is_empty() {
            println!("{} = (not set)", key);
        } else {
            println!("{} = {}", key, value);
        }
    }

    let verbosity = ctx.verbosity();
    if let Some(path) = config.global_config_loaded_from() {
        output::debug(format!("global config: {}", path.display()), verbosity);
    }
    if let Some(path) = config.repo_config_loaded_from() {
        output::debug(format!("repository config: {}", path.display()), verbosity);
    }
    Ok(())
}
