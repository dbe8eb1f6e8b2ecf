//! Expands tracked entries into the concrete files a push transfers.
//!
//! Tracked directories are walked recursively. Anything matching an exclude
//! pattern is skipped, mirroring the `--exclude` arguments handed to rsync.

use super::manifest::TrackedList;
use super::patterns::ExcludePatterns;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scanner for enumerating files below tracked entries
pub struct TrackedScanner<'a> {
    /// Project root every entry is relative to
    root: &'a Path,
    /// Patterns to skip while walking
    excludes: &'a ExcludePatterns,
}

impl<'a> TrackedScanner<'a> {
    /// Create a new scanner
    #[must_use]
    pub const fn new(root: &'a Path, excludes: &'a ExcludePatterns) -> Self {
        Self { root, excludes }
    }

    /// Returns the sorted, project-relative file paths covered by `list`.
    ///
    /// # Errors
    ///
    /// Returns an error if a tracked directory cannot be traversed.
    pub fn scan(&self, list: &TrackedList) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in list.entries() {
            self.scan_entry(entry, &mut files)?;
        }
        files.sort();
        files.dedup();
        Ok(files)
    }

    /// Collects files for a single entry
    fn scan_entry(&self, entry: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let abs = self.root.join(entry);
        if !abs.is_dir() {
            if abs.exists() && !self.excludes.matches(entry) {
                files.push(entry.to_path_buf());
            }
            return Ok(());
        }

        for item in WalkDir::new(&abs)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()))
        {
            let item = item
                .with_context(|| format!("Failed to read directory entry in {}", abs.display()))?;
            if !item.file_type().is_dir()
                && let Ok(relative) = item.path().strip_prefix(self.root)
            {
                files.push(relative.to_path_buf());
            }
        }
        Ok(())
    }

    /// Check an absolute path against the exclude patterns
    fn is_excluded(&self, path: &Path) -> bool {
        path.strip_prefix(self.root)
            .is_ok_and(|relative| self.excludes.matches(relative))
    }
}
