use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::settings::keys;
use crate::utils::format_relative_time;
use anyhow::Result;
use chrono::{DateTime, Utc};
use colored::Colorize;
use std::path::Path;

/// Show the project's remote target and tracked entries
///
/// Read-only: entries that the next push would prune are flagged rather
/// than removed.
///
/// # Errors
///
/// Returns an error if the project is not set up or a required setting is
/// missing or defined more than once.
pub fn execute(ctx: &VmsyncContext, short: bool) -> Result<()> {
    ctx.ensure_initialized()?;

    let settings = ctx.load_settings()?;
    let excludes = ctx.excludes(&settings)?;
    let list = ctx.load_tracked()?;

    if short {
        for entry in list.entries() {
            println!("{} {}", entry_flag(ctx, entry, excludes.matches(entry)), entry.display());
        }
        return Ok(());
    }

    let target = ctx.remote_target(&settings)?;
    println!("{:<11} {}", "Project:".bold(), ctx.project_root.display());
    println!("{:<11} {} (port {})", "Remote:".bold(), target.destination(), target.port);
    println!("{:<11} {}", "SSH key:".bold(), target.key_path.display());
    println!("{:<11} {}", "Config:".bold(), ctx.config_path.display());
    if !target.key_path.exists() {
        crate::output::warning("The SSH key is missing; run 'vmsync setup --force <host>'");
    }
    println!(
        "{:<11} {}",
        "Last push:".bold(),
        describe_last_push(settings.get_optional(keys::LAST_PUSH)?)
    );
    let patterns = excludes.iter().collect::<Vec<_>>().join(" ");
    println!(
        "{:<11} {}",
        "Excluded:".bold(),
        if patterns.is_empty() { "(none)" } else { patterns.as_str() }
    );

    println!();
    if list.is_empty() {
        println!("No tracked files");
        println!("  (use \"vmsync add <path>...\" to track files)");
        return Ok(());
    }

    println!("{} ({}):", "Tracked files".bold(), list.len());
    for entry in list.entries() {
        let abs = ctx.project_root.join(entry);
        let name = if abs.is_dir() {
            format!("{}/", entry.display()).blue().to_string()
        } else {
            entry.display().to_string()
        };
        let note = if excludes.matches(entry) {
            " (excluded)".yellow().to_string()
        } else if std::fs::symlink_metadata(&abs).is_err() {
            " (missing)".red().to_string()
        } else {
            String::new()
        };
        println!("  {name}{note}");
    }
    Ok(())
}

/// One-character state used by `status --short`
fn entry_flag(ctx: &VmsyncContext, entry: &Path, excluded: bool) -> String {
    let abs = ctx.project_root.join(entry);
    if excluded {
        "X".yellow().to_string()
    } else if std::fs::symlink_metadata(&abs).is_err() {
        "!".red().to_string()
    } else if abs.is_dir() {
        "D".blue().to_string()
    } else {
        "F".to_string()
    }
}

fn describe_last_push(value: Option<&str>) -> String {
    match value {
        None => "never".to_string(),
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => {
                let at = at.with_timezone(&Utc);
                format!(
                    "{} ({})",
                    at.format("%Y-%m-%d %H:%M:%S UTC"),
                    format_relative_time(at, Utc::now())
                )
            }
            Err(_) => raw.to_string(),
        },
    }
}
