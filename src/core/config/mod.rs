//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! luna has two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Per-working-tree overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$LUNA_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/luna/config.toml`
//! 3. `~/.lunarc.toml` (canonical write location)
//!
//! # Repo Config Location
//!
//! `<root>/.luna/config.toml`, routed through [`LunaPaths`].
//!
//! # Example
//!
//! ```no_run
//! use luna::core::config::Config;
//! use std::path::Path;
//!
//! let config = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//!
//! println!("Recording as: {}", config.actor());
//! println!("Hint cutoff: {}", config.hint_cutoff());
//! ```

pub mod schema;

pub use schema::{DiffConfig, GlobalConfig, RepoConfig};

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::core::paths::LunaPaths;
use crate::core::tree::TreeFilter;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("'{0}' can only be set in repository config")]
    RepoOnlyKey(ConfigKey),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules automatically. Repo config overrides
/// global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if present)
    pub repo: Option<RepoConfig>,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
    /// Path to the repo config file (if loaded)
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `root` is provided, also loads that working tree's repo config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or fail
    /// validation. Missing config files are not an error.
    pub fn load(root: Option<&Path>) -> Result<Config, ConfigError> {
        let (global, global_path) = Self::load_global(|key| std::env::var(key).ok())?;

        let (repo, repo_path) = match root {
            Some(root) => Self::load_repo(root)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Build a configuration from already-loaded parts, with no backing files.
    pub fn from_parts(global: GlobalConfig, repo: Option<RepoConfig>) -> Config {
        Config {
            global,
            repo,
            global_path: None,
            repo_path: None,
        }
    }

    /// Load global configuration, reading environment variables through `env`.
    fn load_global<F>(env: F) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = env("LUNA_CONFIG").map(PathBuf::from) {
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("luna/config.toml");
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        if let Ok(path) = Self::global_config_path() {
            if path.exists() {
                let config = read_toml(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(root: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(root);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = read_toml(&path)?;
        Ok((Some(config), Some(path)))
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.lunarc.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".lunarc.toml"))
    }

    /// Get the path for repo config under a working tree root.
    pub fn repo_config_path(root: &Path) -> PathBuf {
        LunaPaths::new(root.to_path_buf()).config_path()
    }

    /// Write global config atomically.
    ///
    /// Goes to `path` when given (normally the file it was loaded from),
    /// else to the canonical location.
    pub fn write_global(config: &GlobalConfig, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::global_config_path()?,
        };
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    /// Write repo config atomically.
    ///
    /// The `.luna` directory must already exist; writing config never
    /// initializes a repository.
    pub fn write_repo(root: &Path, config: &RepoConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::repo_config_path(root);
        write_toml_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Configured user name, if any.
    pub fn user(&self) -> Option<&str> {
        self.repo
            .as_ref()
            .and_then(|r| r.user.as_deref())
            .or(self.global.user.as_deref())
    }

    /// The name recorded as creator and history user.
    ///
    /// Falls back to the OS login name.
    pub fn actor(&self) -> String {
        self.user()
            .map(str::to_string)
            .unwrap_or_else(whoami::username)
    }

    /// Names never snapshotted and never touched by reset.
    pub fn exclude(&self) -> &[String] {
        self.repo
            .as_ref()
            .and_then(|r| r.exclude.as_deref())
            .unwrap_or(&[])
    }

    /// Filter for snapshot copies and restores.
    pub fn tree_filter(&self) -> TreeFilter {
        TreeFilter::new(self.exclude())
    }

    /// Names skipped by whole-tree comparison.
    ///
    /// Defaults to `.git` and `.DS_Store`.
    pub fn diff_ignore(&self) -> Vec<String> {
        self.diff_setting(|d| d.ignore.clone()).unwrap_or_else(|| {
            DiffConfig::DEFAULT_IGNORE
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }

    /// Similarity cutoff for intra-line hints.
    ///
    /// Defaults to 0.75.
    pub fn hint_cutoff(&self) -> f32 {
        self.diff_setting(|d| d.hint_cutoff)
            .unwrap_or(DiffConfig::DEFAULT_HINT_CUTOFF)
    }

    fn diff_setting<T>(&self, get: impl Fn(&DiffConfig) -> Option<T>) -> Option<T> {
        self.repo
            .as_ref()
            .and_then(|r| r.diff.as_ref())
            .and_then(&get)
            .or_else(|| self.global.diff.as_ref().and_then(&get))
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

// =============================================================================
// Keyed access for `luna config`
// =============================================================================

/// A settable configuration key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    User,
    Exclude,
    DiffIgnore,
    DiffHintCutoff,
}

impl ConfigKey {
    /// All keys, in listing order.
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::User,
        ConfigKey::Exclude,
        ConfigKey::DiffIgnore,
        ConfigKey::DiffHintCutoff,
    ];

    /// The dotted key name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::User => "user",
            ConfigKey::Exclude => "exclude",
            ConfigKey::DiffIgnore => "diff.ignore",
            ConfigKey::DiffHintCutoff => "diff.hint_cutoff",
        }
    }

    /// Effective value after precedence, formatted for display.
    pub fn effective(&self, config: &Config) -> String {
        match self {
            ConfigKey::User => config.actor(),
            ConfigKey::Exclude => config.exclude().join(","),
            ConfigKey::DiffIgnore => config.diff_ignore().join(","),
            ConfigKey::DiffHintCutoff => config.hint_cutoff().to_string(),
        }
    }

    /// Set this key in repository config.
    pub fn set_repo(&self, config: &mut RepoConfig, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::User => config.user = Some(value.to_string()),
            ConfigKey::Exclude => config.exclude = Some(parse_list(value)),
            ConfigKey::DiffIgnore | ConfigKey::DiffHintCutoff => {
                self.set_diff(config.diff.get_or_insert_with(Default::default), value)?
            }
        }
        config.validate()
    }

    /// Set this key in global config.
    pub fn set_global(&self, config: &mut GlobalConfig, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::User => config.user = Some(value.to_string()),
            ConfigKey::Exclude => return Err(ConfigError::RepoOnlyKey(*self)),
            ConfigKey::DiffIgnore | ConfigKey::DiffHintCutoff => {
                self.set_diff(config.diff.get_or_insert_with(Default::default), value)?
            }
        }
        config.validate()
    }

    fn set_diff(&self, diff: &mut DiffConfig, value: &str) -> Result<(), ConfigError> {
        match self {
            ConfigKey::DiffIgnore => diff.ignore = Some(parse_list(value)),
            ConfigKey::DiffHintCutoff => {
                let cutoff = value.trim().parse::<f32>().map_err(|_| {
                    ConfigError::InvalidValue(format!("'{}' is not a number", value))
                })?;
                diff.hint_cutoff = Some(cutoff);
            }
            ConfigKey::User | ConfigKey::Exclude => {}
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}

/// Comma-separated list, blanks dropped.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically (temp file, sync, rename).
fn write_toml_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let write_error = |path: &Path, source| ConfigError::WriteError {
        path: path.to_path_buf(),
        source,
    };

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| write_error(&temp_path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| write_error(&temp_path, e))?;
    file.sync_all().map_err(|e| write_error(&temp_path, e))?;

    fs::rename(&temp_path, path).map_err(|e| write_error(path, e))?;
    Ok(())
}
