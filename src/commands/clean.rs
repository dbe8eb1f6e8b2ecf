use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::remote::{RemoteTarget, ssh};
use crate::settings::keys;
use anyhow::{Context, Result, bail};
use colored::Colorize;

/// Flags of `vmsync clean`
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CleanOptions {
    /// Only print the planned steps
    pub dry_run: bool,
    /// Actually perform the reset
    pub force: bool,
    /// Leave the remote sandbox directory in place
    pub keep_remote: bool,
    /// Skip every remote step and only delete the settings folder
    pub local_only: bool,
}

/// One remote step of the reset
struct RemoteStep {
    /// What the step does
    description: String,
    /// Shell command run through ssh
    command: String,
}

/// Reset the relationship between the project and its sandbox
///
/// Removes the remote sandbox, then the installed public key, then the local
/// settings folder. With `local_only` the VM is never contacted.
///
/// # Errors
///
/// Returns an error if:
/// - Neither `dry_run` nor `force` is given
/// - The project is not set up
/// - A remote setting is missing, invalid or defined more than once
/// - The host is unreachable or a remote step fails
/// - The settings folder cannot be deleted
pub fn execute(ctx: &VmsyncContext, opts: CleanOptions) -> Result<()> {
    ctx.ensure_initialized()?;

    // Safety check: require either -n or -f flag
    if !opts.dry_run && !opts.force {
        super::print_info("Use 'vmsync clean -n' to see what would be done");
        super::print_info("Use 'vmsync clean -f' to actually reset the project");
        bail!("clean requires either -n (dry run) or -f (force) flag for safety");
    }

    let target = if opts.local_only {
        super::print_warning(
            "Skipping remote cleanup; the sandbox and the installed key stay on the VM",
        );
        None
    } else {
        let settings = ctx.load_settings()?;
        let target = ctx
            .remote_target(&settings)
            .context("Remote settings unusable, nothing removed (use --local-only to only delete local state)")?;
        let comment = settings.get_optional(keys::KEY_COMMENT)?;
        Some((plan(&target, comment, opts)?, target))
    };

    let settings_dir = ctx.settings_dir();

    if opts.dry_run {
        println!("\n{}", "Would perform:".yellow().bold());
        if let Some((steps, target)) = &target {
            for step in steps {
                println!("  {} {}", "would".yellow(), step.description);
                println!("      ssh {} {}", target.host, step.command.dimmed());
            }
        }
        println!(
            "  {} delete {}",
            "would".yellow(),
            settings_dir.display()
        );
        println!();
        super::print_info("Run 'vmsync clean -f' to actually reset the project");
        return Ok(());
    }

    if let Some((steps, target)) = &target {
        let runner = ctx.tool_runner();
        ssh::check_reachable(&runner, target.hostname(), target.connect_timeout)?;
        for step in steps {
            ssh::run_remote(&runner, target, &step.command)
                .with_context(|| format!("Failed to {}", step.description))?;
            crate::output::action("done:", &step.description);
        }
    }

    std::fs::remove_dir_all(&settings_dir)
        .with_context(|| format!("Failed to delete {}", settings_dir.display()))?;
    tracing::info!(path = %settings_dir.display(), "removed settings folder");
    crate::output::action("done:", &format!("delete {}", settings_dir.display()));

    super::print_success("Project reset; run 'vmsync setup <host>' to start over");
    Ok(())
}

/// Remote steps in execution order; the key goes last since ssh needs it
fn plan(target: &RemoteTarget, comment: Option<&str>, opts: CleanOptions) -> Result<Vec<RemoteStep>> {
    let mut steps = Vec::new();
    if !opts.keep_remote {
        steps.push(RemoteStep {
            description: format!("remove sandbox {}", target.destination()),
            command: ssh::rmdir_command(target),
        });
    }
    match comment {
        Some(comment) => steps.push(RemoteStep {
            description: format!("remove key '{comment}' from authorized_keys"),
            command: ssh::unauthorize_command(comment)?,
        }),
        None => super::print_warning(
            "No key_comment recorded; the public key stays in the remote authorized_keys",
        ),
    }
    Ok(steps)
}
