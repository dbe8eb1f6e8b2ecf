//! `add-excluded` and `remove-excluded`: edit the `excluded_files` setting.

use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::settings::keys;
use anyhow::{Result, bail};

/// Add exclude patterns, then prune tracked entries they now match
///
/// # Errors
///
/// Returns an error if the project is not set up, a pattern is invalid, or
/// the settings or tracked list cannot be written.
pub fn add(ctx: &VmsyncContext, patterns: &[String]) -> Result<()> {
    ctx.ensure_initialized()?;
    if patterns.is_empty() {
        bail!("No patterns given");
    }

    let mut settings = ctx.load_settings()?;
    let mut excludes = ctx.excludes(&settings)?;

    let mut added = 0;
    for pattern in patterns {
        if excludes.add(pattern)? {
            crate::output::action("exclude", pattern);
            added += 1;
        } else {
            super::print_info(&format!("Already excluded: {pattern}"));
        }
    }

    settings.set(keys::EXCLUDED_FILES, &excludes.to_setting_value())?;
    settings.save()?;

    let mut list = ctx.load_tracked()?;
    let report = ctx.save_normalized(&mut list, &excludes)?;

    if added > 0 {
        super::print_success(&format!("Added {added} excluded pattern(s)"));
    }
    if !report.excluded.is_empty() {
        super::print_info(&format!(
            "{} tracked path(s) dropped by the new patterns",
            report.excluded.len()
        ));
    }
    Ok(())
}

/// Remove exclude patterns
///
/// Entries pruned earlier are not re-added; track them again with `add`.
///
/// # Errors
///
/// Returns an error if the project is not set up or the settings or tracked
/// list cannot be written.
pub fn remove(ctx: &VmsyncContext, patterns: &[String]) -> Result<()> {
    ctx.ensure_initialized()?;
    if patterns.is_empty() {
        bail!("No patterns given");
    }

    let mut settings = ctx.load_settings()?;
    let mut excludes = ctx.excludes(&settings)?;

    let mut removed = 0;
    for pattern in patterns {
        if excludes.remove(pattern) {
            crate::output::action("include", pattern);
            removed += 1;
        } else {
            super::print_warning(&format!("Not an excluded pattern: {pattern}"));
        }
    }

    settings.set(keys::EXCLUDED_FILES, &excludes.to_setting_value())?;
    settings.save()?;

    let mut list = ctx.load_tracked()?;
    ctx.save_normalized(&mut list, &excludes)?;

    if removed > 0 {
        super::print_success(&format!("Removed {removed} excluded pattern(s)"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::TestProject;
    use std::path::PathBuf;

    #[test]
    fn test_add_excluded_prunes_tracked() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("build/out.bin", "x")?;
        project.create_file("src/main.rs", "x")?;
        project.write_tracked("build\nsrc/main.rs\n")?;

        add(&project.context, &["build/".to_string(), "*.tmp".to_string()])?;

        let settings = project.settings()?;
        assert_eq!(
            settings.get(keys::EXCLUDED_FILES)?,
            "*.swp *.tmp .git build/"
        );
        assert_eq!(project.tracked()?, vec![PathBuf::from("src/main.rs")]);
        Ok(())
    }

    #[test]
    fn test_add_excluded_dedupes_and_rejects_bad_patterns() -> Result<()> {
        let project = TestProject::new()?;
        add(&project.context, &[".git".to_string()])?;
        assert_eq!(project.settings()?.get(keys::EXCLUDED_FILES)?, "*.swp .git");

        assert!(add(&project.context, &["[".to_string()]).is_err());
        Ok(())
    }

    #[test]
    fn test_remove_excluded() -> Result<()> {
        let project = TestProject::new()?;
        remove(
            &project.context,
            &["*.swp".to_string(), "never-there".to_string()],
        )?;
        assert_eq!(project.settings()?.get(keys::EXCLUDED_FILES)?, ".git");

        remove(&project.context, &[".git".to_string()])?;
        assert_eq!(project.settings()?.get(keys::EXCLUDED_FILES)?, "");
        Ok(())
    }
}
