//! Flat key-value settings file.
//!
//! The file holds one `name = value` pair per line. Blank lines and lines
//! starting with `#` are kept verbatim on rewrite but are otherwise ignored.
//! Every lookup filters the lines by key and requires exactly one match, so a
//! hand-edited file with a duplicated key fails loudly instead of silently
//! picking one of the values.

use anyhow::{Context, Result};
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Well-known setting names.
pub mod keys {
    /// `[user@]host` of the test VM.
    pub const REMOTE_HOST: &str = "remote_host";
    /// SSH port of the test VM.
    pub const REMOTE_PORT: &str = "remote_port";
    /// Remote base directory holding project sandboxes.
    pub const REMOTE_DIR: &str = "remote_dir";
    /// Name of the sandbox directory below `remote_dir`.
    pub const PROJECT_NAME: &str = "project_name";
    /// Private key path, relative to the settings folder.
    pub const SSH_KEY: &str = "ssh_key";
    /// Comment embedded in the installed public key.
    pub const KEY_COMMENT: &str = "key_comment";
    /// Whitespace-separated exclude patterns.
    pub const EXCLUDED_FILES: &str = "excluded_files";
    /// RFC 3339 timestamp of the last successful push.
    pub const LAST_PUSH: &str = "last_push";
}

/// Errors raised by setting lookups and updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// No line carries the requested key.
    Missing {
        /// Requested key.
        name: String,
        /// Settings file that was searched.
        path: PathBuf,
    },
    /// More than one line carries the requested key.
    Ambiguous {
        /// Requested key.
        name: String,
        /// Number of matching lines.
        count: usize,
        /// Settings file that was searched.
        path: PathBuf,
    },
    /// Key is empty or contains characters outside `[A-Za-z0-9_.-]`.
    InvalidName(String),
    /// Value contains a line break.
    InvalidValue {
        /// Key the value was meant for.
        name: String,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name, path } => {
                write!(f, "Setting '{name}' not found in {}", path.display())
            }
            Self::Ambiguous { name, count, path } => write!(
                f,
                "Setting '{name}' is defined {count} times in {}; expected exactly one",
                path.display()
            ),
            Self::InvalidName(name) => write!(
                f,
                "Invalid setting name '{name}': use letters, digits, '_', '.' or '-'"
            ),
            Self::InvalidValue { name } => {
                write!(f, "Invalid value for '{name}': values must fit on one line")
            }
        }
    }
}

impl std::error::Error for SettingsError {}

/// One physical line of the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// A `name = value` pair.
    Entry {
        /// Key, trimmed.
        name: String,
        /// Value, trimmed.
        value: String,
    },
    /// Comment, blank or unparsable line, kept verbatim.
    Other(String),
}

/// In-memory view of a settings file.
#[derive(Debug, Clone)]
pub struct Settings {
    /// File the settings were read from and are written back to.
    path: PathBuf,
    /// Lines in file order.
    lines: Vec<Line>,
}

impl Settings {
    /// Creates an empty settings store bound to `path`. Nothing is written
    /// until [`Settings::save`] is called.
    #[must_use]
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            lines: Vec::new(),
        }
    }

    /// Reads a settings file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Ok(Self::parse(path.to_path_buf(), &content))
    }

    /// Parses settings text without touching the filesystem.
    #[must_use]
    pub fn parse(path: PathBuf, content: &str) -> Self {
        let lines = content.lines().map(parse_line).collect();
        Self { path, lines }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the value of `name`, which must be defined exactly once.
    ///
    /// # Errors
    /// [`SettingsError::Missing`] when no line matches,
    /// [`SettingsError::Ambiguous`] when several do.
    pub fn get(&self, name: &str) -> Result<&str, SettingsError> {
        self.get_optional(name)?
            .ok_or_else(|| SettingsError::Missing {
                name: name.to_string(),
                path: self.path.clone(),
            })
    }

    /// Returns the value of `name` if it is defined.
    ///
    /// # Errors
    /// [`SettingsError::Ambiguous`] when several lines match.
    pub fn get_optional(&self, name: &str) -> Result<Option<&str>, SettingsError> {
        let mut matches = self
            .entries()
            .filter(|(n, _)| *n == name)
            .map(|(_, v)| v);
        let Some(first) = matches.next() else {
            return Ok(None);
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(SettingsError::Ambiguous {
                name: name.to_string(),
                count: extra + 1,
                path: self.path.clone(),
            });
        }
        Ok(Some(first))
    }

    /// Sets `name` to `value`, rewriting the existing line in place or
    /// appending a new one.
    ///
    /// # Errors
    /// Rejects invalid names and multi-line values, and refuses to pick
    /// between duplicated keys.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), SettingsError> {
        validate_name(name)?;
        if value.contains(['\n', '\r']) {
            return Err(SettingsError::InvalidValue {
                name: name.to_string(),
            });
        }
        // Surfaces duplicates before any mutation
        self.get_optional(name)?;

        let value = value.trim().to_string();
        if let Some(Line::Entry { value: slot, .. }) = self
            .lines
            .iter_mut()
            .find(|line| matches!(line, Line::Entry { name: n, .. } if n == name))
        {
            *slot = value;
        } else {
            self.lines.push(Line::Entry {
                name: name.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Removes every line defining `name` and returns how many were removed.
    ///
    /// # Errors
    /// [`SettingsError::Missing`] when the key is not defined.
    pub fn unset(&mut self, name: &str) -> Result<usize, SettingsError> {
        let before = self.lines.len();
        self.lines
            .retain(|line| !matches!(line, Line::Entry { name: n, .. } if n == name));
        let removed = before - self.lines.len();
        if removed == 0 {
            return Err(SettingsError::Missing {
                name: name.to_string(),
                path: self.path.clone(),
            });
        }
        Ok(removed)
    }

    /// All `(name, value)` pairs in file order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { name, value } => Some((name.as_str(), value.as_str())),
            Line::Other(_) => None,
        })
    }

    /// Serializes the settings back to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Entry { name, value } => {
                    out.push_str(name);
                    out.push_str(" = ");
                    out.push_str(value);
                }
                Line::Other(raw) => out.push_str(raw),
            }
            out.push('\n');
        }
        out
    }

    /// Writes the settings file, replacing it atomically.
    ///
    /// # Errors
    /// Returns an error if the temporary file cannot be written or renamed.
    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, self.render().as_bytes())?;
        tracing::debug!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// Parses a single settings line.
fn parse_line(raw: &str) -> Line {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Line::Other(raw.to_string());
    }
    match trimmed.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Line::Entry {
            name: name.trim().to_string(),
            value: value.trim().to_string(),
        },
        _ => {
            tracing::warn!(line = raw, "ignoring malformed settings line");
            Line::Other(raw.to_string())
        }
    }
}

/// Checks that a setting name is usable as a key.
fn validate_name(name: &str) -> Result<(), SettingsError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(())
    } else {
        Err(SettingsError::InvalidName(name.to_string()))
    }
}

/// Writes `contents` to a temporary file next to `path`, then renames it over `path`.
///
/// # Errors
/// Returns an error if `path` has no parent or any write fails.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temporary file in {}", parent.display()))?;
    tmp.write_all(contents)?;
    tmp.persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Settings {
        Settings::parse(
            PathBuf::from("settings"),
            "# vmsync settings\nremote_host = dev@vm\nremote_dir=sandbox\n\nexcluded_files = .git *.swp\n",
        )
    }

    #[test]
    fn test_get_exactly_one() {
        let settings = sample();
        assert_eq!(settings.get("remote_host"), Ok("dev@vm"));
        assert_eq!(settings.get("remote_dir"), Ok("sandbox"));
        assert_eq!(settings.get("excluded_files"), Ok(".git *.swp"));
    }

    #[test]
    fn test_get_missing() {
        let settings = sample();
        assert!(matches!(
            settings.get("remote_port"),
            Err(SettingsError::Missing { .. })
        ));
        assert_eq!(settings.get_optional("remote_port"), Ok(None));
    }

    #[test]
    fn test_get_ambiguous() {
        let settings = Settings::parse(
            PathBuf::from("settings"),
            "remote_dir = a\nremote_dir = b\n",
        );
        let err = settings.get("remote_dir").unwrap_err();
        assert!(matches!(err, SettingsError::Ambiguous { count: 2, .. }));
        assert!(err.to_string().contains("exactly one"));
        assert!(settings.get_optional("remote_dir").is_err());
    }

    #[test]
    fn test_value_outlives_lookup_name() {
        let settings = sample();
        let value = {
            let name = format!("remote_{}", "host");
            settings.get_optional(&name).unwrap()
        };
        assert_eq!(value, Some("dev@vm"));
    }

    #[test]
    fn test_prefix_key_is_not_a_match() {
        let settings = Settings::parse(
            PathBuf::from("settings"),
            "remote_dir_old = x\nremote_dir = y\n",
        );
        assert_eq!(settings.get("remote_dir"), Ok("y"));
    }

    #[test]
    fn test_set_in_place_keeps_comments() {
        let mut settings = sample();
        settings.set("remote_dir", "/srv/sandbox").unwrap();
        let rendered = settings.render();
        assert!(rendered.starts_with("# vmsync settings\n"));
        assert!(rendered.contains("remote_dir = /srv/sandbox\n"));
        assert_eq!(rendered.matches("remote_dir").count(), 1);
    }

    #[test]
    fn test_set_appends() {
        let mut settings = sample();
        settings.set("remote_port", "2222").unwrap();
        assert!(settings.render().ends_with("remote_port = 2222\n"));
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut settings = sample();
        assert!(matches!(
            settings.set("bad key", "x"),
            Err(SettingsError::InvalidName(_))
        ));
        assert!(matches!(
            settings.set("remote_dir", "a\nb"),
            Err(SettingsError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_set_refuses_duplicates() {
        let mut settings = Settings::parse(PathBuf::from("settings"), "k = 1\nk = 2\n");
        assert!(matches!(
            settings.set("k", "3"),
            Err(SettingsError::Ambiguous { .. })
        ));
    }

    #[test]
    fn test_unset() {
        let mut settings = sample();
        assert_eq!(settings.unset("remote_dir"), Ok(1));
        assert!(settings.get_optional("remote_dir").unwrap().is_none());
        assert!(matches!(
            settings.unset("remote_dir"),
            Err(SettingsError::Missing { .. })
        ));
    }

    #[test]
    fn test_value_with_equals_sign() {
        let settings = Settings::parse(PathBuf::from("settings"), "opts = -o a=b\n");
        assert_eq!(settings.get("opts"), Ok("-o a=b"));
    }

    #[test]
    fn test_save_and_load() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("settings");
        let mut settings = Settings::empty(path.clone());
        settings.set("remote_host", "dev@vm")?;
        settings.set("remote_port", "22")?;
        settings.save()?;

        let loaded = Settings::load(&path)?;
        assert_eq!(loaded.get("remote_host")?, "dev@vm");
        assert_eq!(
            loaded.entries().collect::<Vec<_>>(),
            vec![("remote_host", "dev@vm"), ("remote_port", "22")]
        );
        Ok(())
    }
}
