use crate::commands::context::CommandContext;
use crate::utils::paths::{current_dir_or, resolve_in_project};
use crate::{SETTINGS_DIR, VmsyncContext};
use anyhow::{Result, bail};
use std::path::Path;

/// Add files and directories to the tracked list
///
/// # Errors
///
/// Returns an error if:
/// - The project is not set up
/// - A path is outside the project or inside the settings folder
/// - A path does not exist and `force` is not given
/// - The tracked list cannot be written
pub fn execute(ctx: &VmsyncContext, paths: &[String], force: bool) -> Result<()> {
    ctx.ensure_initialized()?;
    if paths.is_empty() {
        bail!("Nothing specified, nothing added");
    }

    let settings = ctx.load_settings()?;
    let excludes = ctx.excludes(&settings)?;
    let mut list = ctx.load_tracked()?;
    let cwd = current_dir_or(&ctx.project_root);

    let mut added = 0;
    for input in paths {
        let relative = resolve_in_project(input, &cwd, &ctx.project_root)?;
        if relative.starts_with(SETTINGS_DIR) {
            bail!("Refusing to track the {SETTINGS_DIR} settings folder: {input}");
        }

        if std::fs::symlink_metadata(ctx.project_root.join(&relative)).is_err() {
            if force {
                super::print_warning(&format!("Skipping non-existent path: {input}"));
                continue;
            }
            bail!("Path does not exist: {input}");
        }

        if let Some(pattern) = excludes.matching_pattern(&relative) {
            super::print_warning(&format!(
                "Skipping '{}': matches excluded pattern '{pattern}'",
                relative.display()
            ));
            continue;
        }

        if list.contains(&relative) {
            super::print_info(&format!("Already tracked: {}", relative.display()));
            continue;
        }
        if list.covers(&relative) {
            super::print_info(&format!(
                "Already tracked through a parent directory: {}",
                relative.display()
            ));
            continue;
        }

        crate::output::action("add", &display_entry(ctx, &relative));
        list.add(relative);
        added += 1;
    }

    ctx.save_normalized(&mut list, &excludes)?;

    if added > 0 {
        super::print_success(&format!("Now tracking {added} new path(s)"));
    } else {
        super::print_info("No new paths were added");
    }
    Ok(())
}

/// Entry with a trailing `/` for directories
pub(crate) fn display_entry(ctx: &VmsyncContext, relative: &Path) -> String {
    if ctx.project_root.join(relative).is_dir() {
        format!("{}/", relative.display())
    } else {
        relative.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::TestProject;
    use std::path::PathBuf;

    #[test]
    fn test_add_files_and_directories() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("src/main.rs", "fn main() {}")?;
        project.create_file("src/lib.rs", "")?;
        project.create_file("Cargo.toml", "[package]")?;

        execute(
            &project.context,
            &[project.arg("src"), project.arg("Cargo.toml")],
            false,
        )?;

        assert_eq!(
            project.tracked()?,
            vec![PathBuf::from("Cargo.toml"), PathBuf::from("src")]
        );
        Ok(())
    }

    #[test]
    fn test_add_nonexistent_requires_force() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("real.txt", "x")?;

        let err = execute(&project.context, &[project.arg("ghost.txt")], false).unwrap_err();
        assert!(err.to_string().contains("does not exist"));

        execute(
            &project.context,
            &[project.arg("ghost.txt"), project.arg("real.txt")],
            true,
        )?;
        assert_eq!(project.tracked()?, vec![PathBuf::from("real.txt")]);
        Ok(())
    }

    #[test]
    fn test_add_skips_excluded() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file(".git/HEAD", "ref")?;
        project.create_file("notes.swp", "")?;

        execute(
            &project.context,
            &[project.arg(".git/HEAD"), project.arg("notes.swp")],
            false,
        )?;
        assert!(project.tracked()?.is_empty());
        Ok(())
    }

    #[test]
    fn test_add_is_idempotent() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("a.txt", "a")?;
        project.create_file("dir/b.txt", "b")?;

        execute(&project.context, &[project.arg("a.txt"), project.arg("dir")], false)?;
        execute(
            &project.context,
            &[project.arg("a.txt"), project.arg("dir/b.txt")],
            false,
        )?;
        assert_eq!(
            project.tracked()?,
            vec![PathBuf::from("a.txt"), PathBuf::from("dir")]
        );
        Ok(())
    }

    #[test]
    fn test_add_rejects_outside_and_settings_folder() -> Result<()> {
        let project = TestProject::new()?;
        let outside = project.temp_dir.path().join("config.toml");

        let err = execute(
            &project.context,
            &[outside.to_string_lossy().into_owned()],
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside the project"));

        let err = execute(&project.context, &[project.arg(".vmsync/id_ed25519")], false)
            .unwrap_err();
        assert!(err.to_string().contains("settings folder"));
        Ok(())
    }

    #[test]
    fn test_add_requires_setup() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let ctx = VmsyncContext::new_explicit(dir.path().to_path_buf(), dir.path().join("c.toml"))?;
        let err = execute(&ctx, &["x".to_string()], false).unwrap_err();
        assert!(err.to_string().contains("vmsync setup"));
        Ok(())
    }
}
