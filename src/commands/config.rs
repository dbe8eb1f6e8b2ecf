use crate::VmsyncContext;
use crate::commands::context::CommandContext;
use crate::output;
use crate::remote::{parse_port, validate_host, validate_project_name};
use crate::settings::{Settings, keys};
use crate::tracking::ExcludePatterns;
use anyhow::Result;
use colored::Colorize;

/// Execute config command to get/set project settings
///
/// Reading a key requires it to be defined exactly once, like every other
/// settings lookup. Editing `excluded_files` does not prune the tracked list;
/// `add-excluded` does.
///
/// # Errors
///
/// Returns an error if:
/// - The project is not set up
/// - The key is missing or ambiguous
/// - The value is rejected for a well-known key
/// - Failed to save the settings file
pub fn execute(
    ctx: &VmsyncContext,
    key: Option<&str>,
    value: Option<&str>,
    unset: bool,
    list: bool,
) -> Result<()> {
    ctx.ensure_initialized()?;
    let mut settings = ctx.load_settings()?;

    // If --list flag is set or no key is provided, show all settings
    let Some(key) = key.filter(|_| !list) else {
        show_all(&settings);
        return Ok(());
    };

    if unset {
        let removed = settings.unset(key)?;
        settings.save()?;
        if removed > 1 {
            output::success(&format!("Unset {key} ({removed} lines)"));
        } else {
            output::success(&format!("Unset {key}"));
        }
    } else if let Some(value) = value {
        let value = checked_value(key, value)?;
        settings.set(key, &value)?;
        settings.save()?;
        output::success(&format!("Set {key} = {value}"));
    } else {
        println!("{}", settings.get(key)?);
    }

    Ok(())
}

/// Validates values of well-known keys, normalizing where there is a
/// canonical form
fn checked_value(key: &str, value: &str) -> Result<String> {
    match key {
        keys::REMOTE_HOST => validate_host(value)?,
        keys::REMOTE_PORT => return Ok(parse_port(value)?.to_string()),
        keys::PROJECT_NAME => validate_project_name(value)?,
        keys::EXCLUDED_FILES => {
            return Ok(ExcludePatterns::from_patterns(value.split_whitespace())?.to_setting_value());
        }
        _ => {}
    }
    Ok(value.to_string())
}

/// Show all settings in file order
fn show_all(settings: &Settings) {
    let mut empty = true;
    for (name, value) in settings.entries() {
        println!("{} = {value}", name.bold());
        empty = false;
    }
    if empty {
        output::info("No settings defined");
    }
}
