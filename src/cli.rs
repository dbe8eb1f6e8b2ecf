//! Command-line interface definitions for vmsync.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes (#[arg(help = "...")]),
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Main CLI structure for vmsync.
#[derive(Parser)]
#[command(
    name = "vmsync",
    version = crate::VERSION,
    about = "Push a tracked subset of a project to a test VM",
    long_about = "Keeps a per-project list of tracked files and copies them to a sandbox \
                  directory on a test virtual machine with rsync over ssh, preserving the \
                  host's file permissions"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Provision SSH access and the remote sandbox for this directory
    Setup {
        /// Remote host as [user@]host
        host: String,

        /// Remote base directory holding project sandboxes
        #[arg(short = 'd', long)]
        remote_dir: Option<String>,

        /// SSH port
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Sandbox directory name (defaults to the project directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Provision again over an existing setup, keeping tracked files
        #[arg(short, long)]
        force: bool,
    },

    /// Add files or directories to the tracked list
    Add {
        /// Paths to add
        #[arg(required = true)]
        paths: Vec<String>,

        /// Skip paths that do not exist instead of failing
        #[arg(short, long)]
        force: bool,
    },

    /// Remove entries from the tracked list
    #[command(alias = "rm")]
    Remove {
        /// Paths, directories or glob patterns to remove
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Add patterns to the excluded files
    AddExcluded {
        /// Path prefixes, names or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Remove patterns from the excluded files
    RemoveExcluded {
        /// Patterns to remove
        #[arg(required = true)]
        patterns: Vec<String>,
    },

    /// Show the remote target and tracked files
    Status {
        /// One tracked entry per line with a state flag
        #[arg(short, long)]
        short: bool,
    },

    /// List the files a push would transfer
    LsFiles,

    /// Copy tracked files to the remote sandbox
    Push {
        /// Show what would be transferred without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Delete remote files that are no longer present locally
        #[arg(long)]
        delete: bool,
    },

    /// Remove the remote sandbox, the installed key and local settings
    Clean {
        /// Dry run - only show what would be done
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Actually reset the project
        #[arg(short, long)]
        force: bool,

        /// Leave the remote sandbox directory in place
        #[arg(long)]
        keep_remote: bool,

        /// Only delete local state; the VM is not contacted
        #[arg(long, conflicts_with = "keep_remote")]
        local_only: bool,
    },

    /// Get and set project settings
    Config {
        /// Setting name
        key: Option<String>,

        /// Value to set
        value: Option<String>,

        /// Remove the setting
        #[arg(long, conflicts_with = "value")]
        unset: bool,

        /// List all settings
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_rm_alias() {
        let cli = Cli::try_parse_from(["vmsync", "rm", "a.txt"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove { ref paths } if paths == &["a.txt"]));
    }

    #[test]
    fn test_setup_rejects_port_zero() {
        assert!(Cli::try_parse_from(["vmsync", "setup", "vm", "--port", "0"]).is_err());
        let cli = Cli::try_parse_from(["vmsync", "setup", "dev@vm", "-p", "2222"]).unwrap();
        assert!(matches!(cli.command, Commands::Setup { port: Some(2222), .. }));
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["vmsync", "push", "-v", "--dry-run"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Push { dry_run: true, delete: false }));
        assert!(Cli::try_parse_from(["vmsync", "-v", "-q", "status"]).is_err());
    }

    #[test]
    fn test_clean_local_only_conflicts_with_keep_remote() {
        let cli = Cli::try_parse_from(["vmsync", "clean", "-f", "--local-only"]).unwrap();
        assert!(matches!(cli.command, Commands::Clean { local_only: true, force: true, .. }));
        assert!(
            Cli::try_parse_from(["vmsync", "clean", "-f", "--local-only", "--keep-remote"])
                .is_err()
        );
    }
}
