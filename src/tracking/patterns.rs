//! Exclude patterns.
//!
//! Patterns live in the `excluded_files` setting as a whitespace-separated
//! list. A pattern is a path prefix, a component name, or a glob.

use anyhow::{Result, bail};
use glob::{MatchOptions, Pattern};
use std::path::{Component, Path};

/// Glob options: `*` must not cross directory separators.
const GLOB_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Ordered, deduplicated set of exclude patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludePatterns {
    /// Patterns, kept sorted.
    patterns: Vec<String>,
}

impl ExcludePatterns {
    /// Parses the `excluded_files` setting value.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let mut patterns: Vec<String> = value
            .split_whitespace()
            .map(canonical)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        patterns.sort();
        patterns.dedup();
        Self { patterns }
    }

    /// Builds a set from individual patterns.
    ///
    /// # Errors
    /// Returns an error if any pattern is empty or contains whitespace.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for pattern in patterns {
            set.add(pattern.as_ref())?;
        }
        Ok(set)
    }

    /// Setting value representation.
    #[must_use]
    pub fn to_setting_value(&self) -> String {
        self.patterns.join(" ")
    }

    /// Adds a pattern; returns `false` if it was already present.
    ///
    /// # Errors
    /// Returns an error if the pattern is empty or contains whitespace.
    pub fn add(&mut self, pattern: &str) -> Result<bool> {
        let pattern = canonical(pattern);
        if pattern.is_empty() {
            bail!("Exclude pattern cannot be empty");
        }
        if pattern.chars().any(char::is_whitespace) {
            bail!("Exclude pattern cannot contain whitespace: '{pattern}'");
        }
        if is_glob(pattern) && Pattern::new(pattern.trim_end_matches('/')).is_err() {
            bail!("Invalid glob pattern: '{pattern}'");
        }
        match self.patterns.binary_search_by(|p| p.as_str().cmp(pattern)) {
            Ok(_) => Ok(false),
            Err(pos) => {
                self.patterns.insert(pos, pattern.to_string());
                Ok(true)
            }
        }
    }

    /// Removes a pattern; returns `false` if it was not present.
    pub fn remove(&mut self, pattern: &str) -> bool {
        let pattern = canonical(pattern);
        let before = self.patterns.len();
        self.patterns.retain(|p| p != pattern);
        before != self.patterns.len()
    }

    /// Iterates over the patterns in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    /// Returns `true` when there are no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Patterns in the form handed to `rsync --exclude`.
    ///
    /// rsync matches an unanchored pattern containing `/` against the tail
    /// of a path, while [`Self::matches`] anchors it at the project root, so
    /// such patterns get a leading `/`.
    pub fn rsync_patterns(&self) -> impl Iterator<Item = String> + '_ {
        self.patterns.iter().map(|pattern| {
            if pattern.trim_end_matches('/').contains('/') && !pattern.starts_with('/') {
                format!("/{pattern}")
            } else {
                pattern.clone()
            }
        })
    }

    /// Returns `true` if the project-relative `path` is excluded.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// Returns the first pattern excluding `path`, if any.
    #[must_use]
    pub fn matching_pattern(&self, path: &Path) -> Option<&str> {
        self.patterns
            .iter()
            .find(|pattern| pattern_matches(pattern, path))
            .map(String::as_str)
    }
}

/// Drops leading `./` segments, which name the project root.
fn canonical(mut pattern: &str) -> &str {
    while let Some(rest) = pattern.strip_prefix("./") {
        pattern = rest;
    }
    pattern
}

/// Returns `true` if the pattern uses glob syntax.
fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Matches a single pattern against a project-relative path.
fn pattern_matches(pattern: &str, path: &Path) -> bool {
    let components: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    // Trailing slash: match a directory of that name anywhere in the path
    if let Some(dir) = pattern.strip_suffix('/') {
        if is_glob(dir) {
            return Pattern::new(dir).is_ok_and(|p| components.iter().any(|c| p.matches(c)))
                || path_prefix_matches_glob(dir, &components);
        }
        let dir_path = Path::new(dir);
        return path.starts_with(dir_path) || components.contains(&dir);
    }

    if is_glob(pattern) {
        let Ok(glob) = Pattern::new(pattern) else {
            return false;
        };
        // Globs with a separator anchor at the project root, others match any component
        if pattern.contains('/') {
            return path_prefix_matches_glob(pattern, &components);
        }
        return components.iter().any(|c| glob.matches(c));
    }

    // Plain pattern: path prefix, or component name when it has no separator
    path.starts_with(Path::new(pattern)) || (!pattern.contains('/') && components.contains(&pattern))
}

/// Returns `true` if any leading sub-path of `components` matches the glob.
fn path_prefix_matches_glob(pattern: &str, components: &[&str]) -> bool {
    let Ok(glob) = Pattern::new(pattern) else {
        return false;
    };
    (1..=components.len()).any(|n| glob.matches_with(&components[..n].join("/"), GLOB_OPTIONS))
}
