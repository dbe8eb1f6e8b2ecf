use anyhow::Result;

use crate::VmsyncContext;
use crate::output;
use crate::remote::{RemoteTarget, ToolRunner};
use crate::settings::{Settings, keys};
use crate::tracking::{ExcludePatterns, NormalizeReport, TrackedList};

/// Trait providing common operations for command modules
pub trait CommandContext {
    /// Ensures the project is set up before executing a command
    ///
    /// # Errors
    ///
    /// Returns an error if the settings folder is missing
    fn ensure_initialized(&self) -> Result<()>;

    /// Loads the project settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read
    fn load_settings(&self) -> Result<Settings>;

    /// Loads the tracked file list
    ///
    /// # Errors
    ///
    /// Returns an error if the list exists but cannot be read
    fn load_tracked(&self) -> Result<TrackedList>;

    /// Exclude patterns recorded in `settings`; none when unset
    ///
    /// # Errors
    ///
    /// Returns an error if `excluded_files` is defined more than once
    fn excludes(&self, settings: &Settings) -> Result<ExcludePatterns>;

    /// Builds the remote target from `settings`
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is missing or malformed
    fn remote_target(&self, settings: &Settings) -> Result<RemoteTarget>;

    /// Creates a `ToolRunner` with the configured programs
    fn tool_runner(&self) -> ToolRunner<'_>;

    /// Normalizes `list`, reports what was pruned, and persists it
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written
    fn save_normalized(
        &self,
        list: &mut TrackedList,
        excludes: &ExcludePatterns,
    ) -> Result<NormalizeReport>;
}

impl CommandContext for VmsyncContext {
    fn ensure_initialized(&self) -> Result<()> {
        self.check_initialized()
    }

    fn load_settings(&self) -> Result<Settings> {
        Settings::load(&self.settings_path())
    }

    fn load_tracked(&self) -> Result<TrackedList> {
        TrackedList::load(&self.tracked_path())
    }

    fn excludes(&self, settings: &Settings) -> Result<ExcludePatterns> {
        Ok(settings
            .get_optional(keys::EXCLUDED_FILES)?
            .map(ExcludePatterns::parse)
            .unwrap_or_default())
    }

    fn remote_target(&self, settings: &Settings) -> Result<RemoteTarget> {
        RemoteTarget::from_settings(settings, &self.settings_dir(), &self.config)
    }

    fn tool_runner(&self) -> ToolRunner<'_> {
        ToolRunner::new(&self.config.tools)
    }

    fn save_normalized(
        &self,
        list: &mut TrackedList,
        excludes: &ExcludePatterns,
    ) -> Result<NormalizeReport> {
        let report = list.normalize(&self.project_root, excludes);
        report_pruned(&report);
        list.save(&self.tracked_path())?;
        Ok(report)
    }
}

/// Prints one warning per entry dropped during normalization
pub fn report_pruned(report: &NormalizeReport) {
    for path in &report.missing {
        output::warning(&format!(
            "No longer tracking '{}': it does not exist",
            path.display()
        ));
    }
    for path in &report.excluded {
        output::warning(&format!(
            "No longer tracking '{}': it matches an excluded pattern",
            path.display()
        ));
    }
    for path in &report.outside {
        output::warning(&format!(
            "No longer tracking '{}': it is outside the project",
            path.display()
        ));
    }
}
