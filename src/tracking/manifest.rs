//! Tracked file list.
//!
//! The list is a plain text file with one project-relative path per line. It
//! is rewritten through [`TrackedList::normalize`] after every change, which
//! keeps it sorted and deduplicated and drops entries that are excluded,
//! outside the project, or gone from disk.

use super::patterns::ExcludePatterns;
use crate::settings::write_atomic;
use anyhow::{Context, Result};
use path_clean::clean;
use std::path::{Path, PathBuf};

/// What a normalization pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Entries whose target no longer exists.
    pub missing: Vec<PathBuf>,
    /// Entries matching an exclude pattern.
    pub excluded: Vec<PathBuf>,
    /// Absolute or `..` entries pointing outside the project root.
    pub outside: Vec<PathBuf>,
    /// Number of duplicate lines folded together.
    pub duplicates: usize,
}

impl NormalizeReport {
    /// Returns `true` if normalization dropped anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty()
            && self.excluded.is_empty()
            && self.outside.is_empty()
            && self.duplicates == 0
    }
}

/// The tracked file list of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedList {
    /// Project-relative entries. Sorted and unique after normalization.
    entries: Vec<PathBuf>,
}

impl TrackedList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a list from raw entries without normalizing them.
    #[must_use]
    pub fn from_entries(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Load the list; a missing file yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracked files: {}", path.display()))?;
        Ok(Self::parse(&content))
    }

    /// Parses list text, one entry per line.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let entries = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect();
        Self { entries }
    }

    /// Save the list, one entry per line.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, self.render().as_bytes())?;
        tracing::debug!(path = %path.display(), entries = self.entries.len(), "saved tracked files");
        Ok(())
    }

    /// Serializes the list to text.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string_lossy());
            out.push('\n');
        }
        out
    }

    /// Entries in list order.
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Returns `true` if the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if `path` is listed verbatim.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e == path)
    }

    /// Returns `true` if `path` is listed or lies inside a listed directory.
    #[must_use]
    pub fn covers(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| path.starts_with(e))
    }

    /// Append an entry; call [`TrackedList::normalize`] afterwards.
    pub fn add(&mut self, path: PathBuf) {
        self.entries.push(path);
    }

    /// Removes every entry for which `predicate` holds and returns them.
    pub fn remove_where<F>(&mut self, predicate: F) -> Vec<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            self.entries.drain(..).partition(|e| predicate(e));
        self.entries = kept;
        removed
    }

    /// Normalizes the list in place.
    ///
    /// In order: clean each path lexically, relativize absolute entries under
    /// `root` and drop those outside it, drop excluded entries, drop entries
    /// whose target does not exist below `root`, then sort and deduplicate.
    /// Running it twice gives the same result as running it once.
    pub fn normalize(&mut self, root: &Path, excludes: &ExcludePatterns) -> NormalizeReport {
        let mut report = NormalizeReport::default();
        let root = clean(root);
        let mut kept = Vec::with_capacity(self.entries.len());

        for raw in self.entries.drain(..) {
            let Some(relative) = relativize(&raw, &root) else {
                report.outside.push(raw);
                continue;
            };
            if excludes.matches(&relative) {
                report.excluded.push(relative);
                continue;
            }
            // symlink_metadata so dangling symlinks still count as present
            if std::fs::symlink_metadata(root.join(&relative)).is_err() {
                report.missing.push(relative);
                continue;
            }
            kept.push(relative);
        }

        kept.sort();
        let before = kept.len();
        kept.dedup();
        report.duplicates = before - kept.len();
        self.entries = kept;

        if !report.is_empty() {
            tracing::debug!(
                missing = report.missing.len(),
                excluded = report.excluded.len(),
                outside = report.outside.len(),
                duplicates = report.duplicates,
                "normalized tracked files"
            );
        }
        report
    }
}

/// Turns an entry into a clean project-relative path.
///
/// Returns `None` for paths that resolve outside `root` or to `root` itself.
#[must_use]
pub fn relativize(entry: &Path, root: &Path) -> Option<PathBuf> {
    let cleaned = clean(entry);
    let relative = if cleaned.is_absolute() {
        cleaned.strip_prefix(root).ok()?.to_path_buf()
    } else {
        cleaned
    };
    if relative.as_os_str().is_empty()
        || relative == Path::new(".")
        || relative.starts_with("..")
    {
        return None;
    }
    Some(relative)
}
