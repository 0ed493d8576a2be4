//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$LUNA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/luna/config.toml`
//! 3. `~/.lunarc.toml` (canonical write location)
//!
//! # Repo Config
//!
//! Located at `.luna/config.toml` inside the working tree.
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., `hint_cutoff` must lie
//! in `(0, 1]` and excluded names must be plain file names).

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::paths::LUNA_DIR_NAME;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// user = "alice"
///
/// [diff]
/// ignore = [".git", ".DS_Store", "target"]
/// hint_cutoff = 0.75
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Name recorded as creator and history user
    pub user: Option<String>,

    /// Diff defaults
    pub diff: Option<DiffConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_user(self.user.as_deref())?;
        if let Some(diff) = &self.diff {
            diff.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// user = "build-bot"
/// exclude = ["target", "node_modules"]
///
/// [diff]
/// hint_cutoff = 0.6
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Name recorded as creator and history user (overrides global)
    pub user: Option<String>,

    /// Entry names never snapshotted and never touched by reset
    pub exclude: Option<Vec<String>>,

    /// Diff overrides
    pub diff: Option<DiffConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_user(self.user.as_deref())?;
        if let Some(names) = &self.exclude {
            validate_names("exclude", names)?;
        }
        if let Some(diff) = &self.diff {
            diff.validate()?;
        }
        Ok(())
    }
}

/// Tree diff settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Entry names skipped by whole-tree comparison
    pub ignore: Option<Vec<String>>,

    /// Minimum similarity for a removed/added pair to get hint lines
    pub hint_cutoff: Option<f32>,
}

impl DiffConfig {
    /// Default names ignored by tree comparison.
    pub const DEFAULT_IGNORE: &'static [&'static str] = &[".git", ".DS_Store"];

    /// Default similarity cutoff for hint lines.
    pub const DEFAULT_HINT_CUTOFF: f32 = 0.75;

    /// Validate the diff configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(names) = &self.ignore {
            validate_names("diff.ignore", names)?;
        }
        if let Some(cutoff) = self.hint_cutoff {
            if !(cutoff > 0.0 && cutoff <= 1.0) {
                return Err(ConfigError::InvalidValue(format!(
                    "diff.hint_cutoff must be in (0, 1], got {}",
                    cutoff
                )));
            }
        }
        Ok(())
    }
}

fn validate_user(user: Option<&str>) -> Result<(), ConfigError> {
    match user {
        Some(u) if u.trim().is_empty() => Err(ConfigError::InvalidValue(
            "user cannot be empty".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Names are matched against single path components, so separators and
/// the metadata directory itself are rejected.
fn validate_names(key: &str, names: &[String]) -> Result<(), ConfigError> {
    for name in names {
        if name.is_empty() || name == "." || name == ".." {
            return Err(ConfigError::InvalidValue(format!(
                "{}: '{}' is not a file name",
                key, name
            )));
        }
        if name.contains('/') || name.contains('\\') {
            return Err(ConfigError::InvalidValue(format!(
                "{}: '{}' must be a single name, not a path",
                key, name
            )));
        }
        if name == LUNA_DIR_NAME {
            return Err(ConfigError::InvalidValue(format!(
                "{}: '{}' is always excluded",
                key, name
            )));
        }
    }
    Ok(())
}
