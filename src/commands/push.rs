use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::output::{self, Verbosity};
use crate::remote::rsync::{PushOptions, RsyncPlan};
use crate::remote::ssh;
use crate::settings::keys;
use anyhow::Result;
use chrono::Utc;

/// Push tracked files to the remote sandbox
///
/// The tracked list is normalized and saved first, so rsync's
/// `--files-from` reads exactly what `status` shows. rsync failures keep
/// rsync's exit code (see [`crate::remote::ToolExit`]).
///
/// # Errors
///
/// Returns an error if:
/// - The project is not set up or its settings are incomplete
/// - The host does not answer ping
/// - rsync fails
pub fn execute(ctx: &VmsyncContext, dry_run: bool, delete: bool) -> Result<()> {
    ctx.ensure_initialized()?;

    let mut settings = ctx.load_settings()?;
    let excludes = ctx.excludes(&settings)?;
    let mut list = ctx.load_tracked()?;
    ctx.save_normalized(&mut list, &excludes)?;

    if list.is_empty() {
        super::print_info("Nothing to push: no files are tracked (use 'vmsync add <path>')");
        return Ok(());
    }

    let target = ctx.remote_target(&settings)?;
    let runner = ctx.tool_runner();
    ssh::check_reachable(&runner, target.hostname(), target.connect_timeout)?;

    let tracked_path = ctx.tracked_path();
    let plan = RsyncPlan {
        target: &target,
        project_root: &ctx.project_root,
        files_from: &tracked_path,
        excludes: &excludes,
        extra_args: &ctx.config.rsync.extra_args,
        options: PushOptions {
            dry_run,
            delete,
            verbose: output::get_verbosity() == Verbosity::Verbose,
        },
    };
    plan.run(&runner)?;

    if dry_run {
        super::print_info(&format!(
            "Dry run: {} tracked path(s) checked against {}",
            list.len(),
            target.destination()
        ));
        return Ok(());
    }

    settings.set(keys::LAST_PUSH, &Utc::now().to_rfc3339())?;
    settings.save()?;
    super::print_success(&format!(
        "Pushed {} tracked path(s) to {}",
        list.len(),
        target.destination()
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::ToolExit;
    use crate::test_utils::fixtures::TestProject;
    use std::path::PathBuf;

    #[test]
    fn test_push_records_last_push() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("a.txt", "a")?;
        project.write_tracked("./a.txt\na.txt\nmissing\n")?;

        execute(&project.context, false, false)?;

        assert_eq!(project.tracked()?, vec![PathBuf::from("a.txt")]);
        let settings = project.settings()?;
        assert!(settings.get_optional(keys::LAST_PUSH)?.is_some());
        Ok(())
    }

    #[test]
    fn test_dry_run_does_not_record_push() -> Result<()> {
        let project = TestProject::new()?;
        project.create_file("a.txt", "a")?;
        project.write_tracked("a.txt\n")?;

        execute(&project.context, true, false)?;
        assert!(project.settings()?.get_optional(keys::LAST_PUSH)?.is_none());
        Ok(())
    }

    #[test]
    fn test_empty_list_skips_remote() -> Result<()> {
        // ping would fail, but an empty list never reaches it
        let project = TestProject::with_tools(|c| c.tools.ping = "false".to_string())?;
        execute(&project.context, false, false)?;
        Ok(())
    }

    #[test]
    fn test_unreachable_host() -> Result<()> {
        let project = TestProject::with_tools(|c| c.tools.ping = "false".to_string())?;
        project.create_file("a.txt", "a")?;
        project.write_tracked("a.txt\n")?;

        let err = execute(&project.context, false, false).unwrap_err();
        assert!(err.to_string().contains("unreachable"));
        Ok(())
    }

    #[test]
    fn test_rsync_failure_keeps_exit_code() -> Result<()> {
        let project = TestProject::with_tools(|c| c.tools.rsync = "false".to_string())?;
        project.create_file("a.txt", "a")?;
        project.write_tracked("a.txt\n")?;

        let err = execute(&project.context, false, false).unwrap_err();
        let exit = err.chain().find_map(|e| e.downcast_ref::<ToolExit>());
        assert_eq!(exit.map(ToolExit::exit_code), Some(1));
        assert!(project.settings()?.get_optional(keys::LAST_PUSH)?.is_none());
        Ok(())
    }
}
