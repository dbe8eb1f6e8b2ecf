#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # vmsync - push a tracked subset of a project to a test VM
//!
//! vmsync keeps a small amount of per-project state next to the sources and
//! hands every piece of real work to the system's `ssh`, `rsync`,
//! `ssh-keygen`, `ssh-copy-id` and `ping` binaries. Files land on the remote
//! side with the host's permissions, which avoids the ownership and mode
//! mismatches of shared folders.
//!
//! ## State
//!
//! A project owns a `.vmsync/` settings folder at its root containing:
//!
//! - `settings`: flat `name = value` store (see [`settings`])
//! - `tracked_files`: sorted, deduplicated list of project-relative paths
//!   (see [`tracking`])
//! - the SSH key pair generated by `vmsync setup`
//!
//! ## Architecture
//!
//! - [`commands`]: Command implementations (setup, add, push, clean, ...)
//! - [`settings`]: The per-project key-value store
//! - [`tracking`]: Tracked list normalization and exclude patterns
//! - [`remote`]: Wrappers around ssh, rsync and friends
//! - [`config`]: Global user configuration
//! - [`output`]: Output styling and verbosity
//! - [`utils`]: Path helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use vmsync::VmsyncContext;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = VmsyncContext::new()?;
//!
//! vmsync::commands::add::execute(&ctx, &["src/main.rs".to_string()], false)?;
//! vmsync::commands::push::execute(&ctx, false, false)?;
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// Global configuration parsing, validation, and management.
pub mod config;

/// Output formatting and verbosity control.
pub mod output;

/// Wrappers around the external ssh/rsync tool chain.
pub mod remote;

/// Flat key-value settings file of a project.
pub mod settings;

/// Tracked file list and exclude patterns.
pub mod tracking;

/// Utility functions and helpers.
pub mod utils;

#[cfg(test)]
pub(crate) mod test_utils;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Current version of the vmsync binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the per-project settings folder.
pub const SETTINGS_DIR: &str = ".vmsync";

/// Name of the settings file inside the settings folder.
pub const SETTINGS_FILE: &str = "settings";

/// Name of the tracked file list inside the settings folder.
pub const TRACKED_FILE: &str = "tracked_files";

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/vmsync/config.toml";

/// Central context for all vmsync operations.
///
/// Holds the project root (the directory owning `.vmsync/`, or the starting
/// directory when no project exists yet) and the global configuration.
///
/// # Examples
///
/// ```no_run
/// use vmsync::VmsyncContext;
///
/// # fn main() -> anyhow::Result<()> {
/// // Discover the project from the current directory
/// let ctx = VmsyncContext::new()?;
///
/// // Explicit paths (for testing)
/// let ctx = VmsyncContext::new_explicit(
///     "/tmp/project".into(),
///     "/tmp/vmsync.toml".into(),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct VmsyncContext {
    /// Root directory of the project.
    pub project_root: PathBuf,

    /// Path to the global configuration file.
    pub config_path: PathBuf,

    /// Loaded global configuration.
    pub config: config::Config,
}

impl VmsyncContext {
    /// Creates a context for the project containing the current directory.
    ///
    /// # Errors
    /// Returns an error if the current directory or the home directory cannot
    /// be determined, or if the configuration cannot be loaded.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        Self::discover(&cwd)
    }

    /// Creates a context for the project containing `start`.
    ///
    /// Walks up from `start` looking for a `.vmsync` folder. When none is
    /// found the project root is `start` itself, which is where `setup`
    /// creates the folder.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded.
    pub fn discover(start: &Path) -> Result<Self> {
        // Check environment variable for config path first
        let config_path = if let Ok(path) = std::env::var("VMSYNC_CONFIG_PATH") {
            utils::paths::make_absolute(&utils::expand_tilde(&path)?)?
        } else {
            let home = dirs::home_dir().context("Could not find home directory")?;
            home.join(DEFAULT_CONFIG_PATH)
        };

        let config = config::Config::load(&config_path)?;

        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.validate_config_file(&config_path) {
            output::warning(&format!("Warning: Configuration validation failed: {e}"));
        }

        let project_root = find_project_root(start).unwrap_or_else(|| start.to_path_buf());
        tracing::debug!(root = %project_root.display(), "resolved project root");

        Ok(Self {
            project_root,
            config_path,
            config,
        })
    }

    /// Creates a context with an explicit project root and config path.
    /// The config file is created with defaults when missing.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(project_root: PathBuf, config_path: PathBuf) -> Result<Self> {
        let config = config::Config::load(&config_path)?;
        Ok(Self {
            project_root,
            config_path,
            config,
        })
    }

    /// Path of the `.vmsync` settings folder.
    #[must_use]
    pub fn settings_dir(&self) -> PathBuf {
        self.project_root.join(SETTINGS_DIR)
    }

    /// Path of the settings file.
    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.settings_dir().join(SETTINGS_FILE)
    }

    /// Path of the tracked file list.
    #[must_use]
    pub fn tracked_path(&self) -> PathBuf {
        self.settings_dir().join(TRACKED_FILE)
    }

    /// Checks whether the settings folder and settings file exist.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.settings_dir().is_dir() && self.settings_path().is_file()
    }

    /// Checks if the project is set up, returning an error if not.
    ///
    /// # Errors
    /// Returns an error if the settings folder is missing.
    pub fn check_initialized(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(anyhow::anyhow!(
                "Not a vmsync project: no {SETTINGS_DIR} folder found in {} or any parent directory. Did you run 'vmsync setup'?",
                self.project_root.display()
            ));
        }
        Ok(())
    }

    /// Creates the settings folder if needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn ensure_settings_dir(&self) -> Result<()> {
        let dir = self.settings_dir();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create settings folder: {}", dir.display()))
    }
}

/// Returns the nearest ancestor of `start` (inclusive) holding a settings folder.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(SETTINGS_DIR).is_dir())
        .map(Path::to_path_buf)
}
