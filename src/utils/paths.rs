use crate::tracking::manifest::relativize;
use anyhow::{Context, Result, bail};
use path_clean::clean;
use std::path::{Path, PathBuf};

/// Makes a path absolute, resolving relative paths from current directory
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined
pub fn make_absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        let current_dir = std::env::current_dir().context("Could not determine current directory")?;
        Ok(current_dir.join(path))
    }
}

/// Resolves a command-line path to a clean project-relative path
///
/// `~` is expanded and relative input is taken from `cwd`, so running
/// `vmsync add main.rs` inside `src/` tracks `src/main.rs`.
///
/// # Errors
///
/// Returns an error if the path is empty or resolves outside `root`.
pub fn resolve_in_project(input: &str, cwd: &Path, root: &Path) -> Result<PathBuf> {
    let expanded = super::expand_tilde(input)?;
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        cwd.join(expanded)
    };
    let absolute = clean(&absolute);
    match relativize(&absolute, &clean(root)) {
        Some(relative) => Ok(relative),
        None if absolute == clean(root) => {
            bail!("Cannot track the project root itself: {input}")
        }
        None => bail!(
            "Path is outside the project {}: {input}",
            root.display()
        ),
    }
}

/// Current directory, or `root` when it cannot be determined
#[must_use]
pub fn current_dir_or(root: &Path) -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| root.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_to_cwd() -> Result<()> {
        let root = Path::new("/work/proj");
        assert_eq!(
            resolve_in_project("main.rs", Path::new("/work/proj/src"), root)?,
            PathBuf::from("src/main.rs")
        );
        assert_eq!(
            resolve_in_project("../Cargo.toml", Path::new("/work/proj/src"), root)?,
            PathBuf::from("Cargo.toml")
        );
        assert_eq!(
            resolve_in_project("/work/proj/docs/", Path::new("/"), root)?,
            PathBuf::from("docs")
        );
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_outside_and_root() {
        let root = Path::new("/work/proj");
        let err = resolve_in_project("/etc/hosts", root, root).unwrap_err();
        assert!(err.to_string().contains("outside the project"));

        let err = resolve_in_project(".", root, root).unwrap_err();
        assert!(err.to_string().contains("project root"));

        assert!(resolve_in_project("../x", root, root).is_err());
    }

    #[test]
    fn test_make_absolute() -> Result<()> {
        assert_eq!(make_absolute(Path::new("/a/b"))?, PathBuf::from("/a/b"));
        assert!(make_absolute(Path::new("rel"))?.is_absolute());
        Ok(())
    }
}
