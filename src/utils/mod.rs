//! Utility functions and helpers.
//!
//! - Path manipulation (tilde expansion, project-relative resolution)
//! - Timestamp formatting for `last_push` and key comments
//!
//! # Examples
//!
//! ```
//! use vmsync::utils::expand_tilde;
//!
//! # fn main() -> anyhow::Result<()> {
//! let path = expand_tilde("~/projects/app")?;
//! # Ok(())
//! # }
//! ```

/// Path manipulation and resolution utilities
pub mod paths;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Expands a path starting with `~/` to the user's home directory.
///
/// # Errors
///
/// Returns an error if the path is empty.
pub fn expand_tilde(path: &str) -> Result<PathBuf> {
    if path.is_empty() {
        anyhow::bail!("Path cannot be empty");
    }
    if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home);
    }
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return Ok(home.join(rest));
    }
    Ok(PathBuf::from(path))
}

/// Compact UTC timestamp used in generated key comments, e.g. `20261019T120000`.
#[must_use]
pub fn compact_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%dT%H%M%S").to_string()
}

/// Describes how long ago `then` was, relative to `now`.
#[must_use]
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds();
    if secs < 0 {
        return "in the future".to_string();
    }
    let (amount, unit) = match secs {
        0..=59 => return "just now".to_string(),
        60..=3599 => (secs / 60, "minute"),
        3600..=86_399 => (secs / 3600, "hour"),
        _ => (secs / 86_400, "day"),
    };
    if amount == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{amount} {unit}s ago")
    }
}
