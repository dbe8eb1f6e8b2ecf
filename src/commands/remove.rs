use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::utils::paths::{current_dir_or, resolve_in_project};
use anyhow::{Result, bail};
use glob::Pattern;
use std::path::{Path, PathBuf};

/// What a single command-line argument selects in the tracked list
enum Selector {
    /// An entry, or every entry below a directory
    Path(PathBuf),
    /// Glob matched against project-relative entries
    Glob(Pattern),
}

impl Selector {
    fn matches(&self, entry: &Path) -> bool {
        match self {
            Self::Path(path) => entry.starts_with(path),
            Self::Glob(pattern) => pattern.matches_path(entry),
        }
    }
}

/// Execute remove command - drop entries from the tracked list
///
/// Files on disk are never touched. A directory argument removes every entry
/// below it; glob arguments match project-relative entries.
///
/// # Errors
///
/// Returns an error if:
/// - The project is not set up
/// - A path argument lies outside the project
/// - The tracked list cannot be written
pub fn execute(ctx: &VmsyncContext, paths: &[String]) -> Result<()> {
    ctx.ensure_initialized()?;
    if paths.is_empty() {
        bail!("Nothing specified, nothing removed");
    }

    let settings = ctx.load_settings()?;
    let excludes = ctx.excludes(&settings)?;
    let mut list = ctx.load_tracked()?;
    let cwd = current_dir_or(&ctx.project_root);

    let mut removed_count = 0;
    for input in paths {
        let selector = selector_for(ctx, input, &cwd)?;
        let removed = list.remove_where(|entry| selector.matches(entry));

        if removed.is_empty() {
            super::print_warning(&format!("Not tracked: {input}"));
            continue;
        }
        for path in &removed {
            crate::output::action("remove", &path.display().to_string());
        }
        removed_count += removed.len();
    }

    ctx.save_normalized(&mut list, &excludes)?;

    if removed_count > 0 {
        super::print_success(&format!("Stopped tracking {removed_count} path(s)"));
    }
    Ok(())
}

fn selector_for(ctx: &VmsyncContext, input: &str, cwd: &Path) -> Result<Selector> {
    if input.contains(['*', '?', '[']) {
        let root = ctx.project_root.to_string_lossy();
        let relative = input
            .strip_prefix(root.as_ref())
            .map_or(input, |rest| rest.trim_start_matches('/'));
        let relative = relative.strip_prefix("./").unwrap_or(relative);
        match Pattern::new(relative) {
            Ok(pattern) => return Ok(Selector::Glob(pattern)),
            Err(e) => bail!("Invalid glob pattern '{input}': {e}"),
        }
    }
    Ok(Selector::Path(resolve_in_project(
        input,
        cwd,
        &ctx.project_root,
    )?))
}
