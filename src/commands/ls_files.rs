use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::tracking::TrackedScanner;
use anyhow::Result;
use std::path::PathBuf;

/// Print the files a push would transfer, one project-relative path per line
///
/// # Errors
///
/// Returns an error if the project is not set up or a tracked directory
/// cannot be walked.
pub fn execute(ctx: &VmsyncContext) -> Result<()> {
    let files = transfer_list(ctx)?;
    for file in &files {
        println!("{}", file.display());
    }
    crate::output::verbose(&format!("{} file(s)", files.len()));
    Ok(())
}

/// Files covered by the tracked list as push would normalize it.
///
/// The list on disk is left as it is.
fn transfer_list(ctx: &VmsyncContext) -> Result<Vec<PathBuf>> {
    ctx.ensure_initialized()?;

    let settings = ctx.load_settings()?;
    let excludes = ctx.excludes(&settings)?;
    let mut list = ctx.load_tracked()?;
    list.normalize(&ctx.project_root, &excludes);

    TrackedScanner::new(&ctx.project_root, &excludes).scan(&list)
}
