//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! Version arguments are taken as strings and validated by the handlers, so
//! that a bad value reports `unknown version: <value>` like a missing one.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Luna - local full-copy snapshots of a working directory
#[derive(Parser, Debug)]
#[command(name = "luna")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if luna was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a luna repository in the working directory
    #[command(
        name = "init",
        long_about = "Create a luna repository in the working directory.\n\n\
            Creates the .luna directory holding the metadata record and the \
            snapshot store. Running init in an existing repository changes \
            nothing and succeeds with a warning."
    )]
    Init,

    /// Snapshot the working tree as a new version
    #[command(
        name = "commit",
        long_about = "Snapshot the working tree as a new version.\n\n\
            Copies every file and directory under the root, except .luna and \
            configured exclusions, into a new numbered snapshot. The new \
            version becomes the current version.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Save the current state
    luna commit \"before refactor\"

    # See what was saved
    luna log"
    )]
    Commit {
        /// Message stored with the version
        message: String,
    },

    /// Replace the message of an existing version
    #[command(name = "revise")]
    Revise {
        /// Version number
        version: String,
        /// New message
        message: String,
    },

    /// Restore the working tree to a version
    #[command(
        name = "reset",
        long_about = "Restore the working tree to a version.\n\n\
            Replaces everything under the root, except .luna and configured \
            exclusions, with the contents of the snapshot. Uncommitted changes \
            are lost. Without a version, restores the current version.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Throw away changes since the current version
    luna reset

    # Go back to version 2
    luna reset 2"
    )]
    Reset {
        /// Version number (default: current version)
        version: Option<String>,
    },

    /// List retained versions
    #[command(name = "log")]
    Log,

    /// Show the audit log of repository operations
    #[command(name = "history")]
    History,

    /// Show the metadata record, or one field of it
    #[command(name = "info")]
    Info {
        /// Top-level field name (e.g. cur_version)
        field: Option<String>,
    },

    /// Show the details of one version
    #[command(name = "view")]
    View {
        /// Version number
        version: String,
    },

    /// Remove the repository and every snapshot
    #[command(
        name = "discard",
        long_about = "Remove the repository and every snapshot.\n\n\
            Deletes the .luna directory. The working tree itself is not \
            touched. There is no confirmation and no undo."
    )]
    Discard,

    /// Delete one version and its snapshot
    #[command(
        name = "delete",
        long_about = "Delete one version and its snapshot.\n\n\
            Version numbers are never reused. Deleting the current version \
            leaves the repository with no current version until the next \
            commit or reset."
    )]
    Delete {
        /// Version number
        version: String,
    },

    /// Compare versions with each other or with the working tree
    #[command(
        name = "diff",
        long_about = "Compare versions with each other or with the working tree.\n\n\
            The left side is the current version unless V1 is a number. The \
            right side is the working tree unless V2 is a number. Use - to \
            keep the default for a slot.\n\n\
            A name in place of V1 compares that single file. A name in place \
            of V2 compares that single file when V1 is a number or -.",
        after_help = "\
WORKFLOW EXAMPLES:
    # What changed since the current version
    luna diff

    # Compare two versions
    luna diff 1 2

    # One file, current version against the working tree
    luna diff notes.txt

    # One file, version 1 against the working tree
    luna diff 1 notes.txt

    # One file, version 1 against version 3
    luna diff 1 3 --file notes.txt"
    )]
    Diff {
        /// Left version, `-`, or a file name
        v1: Option<String>,
        /// Right version, `-`, or a file name
        v2: Option<String>,
        /// Compare only this file
        #[arg(long)]
        file: Option<String>,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Get, set, or list configuration values.\n\n\
            Keys: user, exclude, diff.ignore, diff.hint_cutoff. List values \
            are comma separated. Without --global, values are written to the \
            repository config in .luna/config.toml.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Never snapshot build output
    luna config set exclude target,node_modules

    # Name recorded in history, for every repository
    luna config set user alice --global

    # Show effective values
    luna config list"
    )]
    Config {
        /// Use the global config file
        #[arg(long, global = true)]
        global: bool,

        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for luna commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    luna completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    luna completion zsh >> ~/.zshrc

    # Fish
    luna completion fish > ~/.config/fish/completions/luna.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
