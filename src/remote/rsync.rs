use super::RemoteTarget;
use super::tools::{Tool, ToolRunner};
use crate::SETTINGS_DIR;
use crate::tracking::ExcludePatterns;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;

/// Flags forwarded to rsync
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct PushOptions {
    /// `--dry-run`
    pub dry_run: bool,
    /// `--delete`
    pub delete: bool,
    /// `--verbose --itemize-changes`
    pub verbose: bool,
}

/// A fully described rsync invocation
#[derive(Debug, Clone)]
pub struct RsyncPlan<'a> {
    /// Where the files go
    pub target: &'a RemoteTarget,
    /// Source directory; tracked entries are relative to it
    pub project_root: &'a Path,
    /// File handed to `--files-from`
    pub files_from: &'a Path,
    /// Forwarded as `--exclude`
    pub excludes: &'a ExcludePatterns,
    /// Appended verbatim
    pub extra_args: &'a [String],
    /// Forwarded flags
    pub options: PushOptions,
}

impl RsyncPlan<'_> {
    /// Builds the rsync argument list
    ///
    /// `ssh_program` is the resolved ssh binary used for `-e`.
    #[must_use]
    pub fn args(&self, ssh_program: &Path) -> Vec<OsString> {
        // -a keeps permissions, times and symlinks; files-from disables the
        // recursion -a normally implies, so -r is explicit
        let mut args: Vec<OsString> = vec!["-a".into(), "-r".into(), "--relative".into()];

        let mut files_from = OsString::from("--files-from=");
        files_from.push(self.files_from);
        args.push(files_from);

        for pattern in self.excludes.rsync_patterns() {
            args.push(format!("--exclude={pattern}").into());
        }
        // The settings folder holds the private key; never ship it
        args.push(format!("--exclude=/{SETTINGS_DIR}/").into());

        args.push("-e".into());
        args.push(self.ssh_command(ssh_program).into());

        if self.options.dry_run {
            args.push("--dry-run".into());
        }
        if self.options.delete {
            args.push("--delete".into());
        }
        if self.options.verbose {
            args.push("--verbose".into());
            args.push("--itemize-changes".into());
        }
        args.extend(self.extra_args.iter().map(OsString::from));

        let mut source = self.project_root.as_os_str().to_owned();
        source.push("/");
        args.push(source);
        args.push(self.target.destination().into());
        args
    }

    /// The `-e` remote shell command
    fn ssh_command(&self, ssh_program: &Path) -> String {
        let mut words = vec![ssh_program.to_string_lossy().into_owned()];
        words.extend(
            self.target
                .ssh_options()
                .into_iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        shell_words::join(words)
    }

    /// Runs rsync with inherited stdio
    ///
    /// # Errors
    ///
    /// Returns an error carrying rsync's exit code if it fails.
    pub fn run(&self, runner: &ToolRunner<'_>) -> Result<()> {
        let ssh = runner.resolve(Tool::Ssh)?;
        let args = self.args(&ssh);
        tracing::info!(
            destination = %self.target.destination(),
            dry_run = self.options.dry_run,
            "pushing tracked files"
        );
        runner
            .run(Tool::Rsync, &args)
            .with_context(|| format!("rsync to {} failed", self.target.destination()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn target() -> RemoteTarget {
        RemoteTarget {
            host: "dev@vm".to_string(),
            port: 2222,
            key_path: PathBuf::from("/home/me/My Project/.vmsync/id_ed25519"),
            remote_dir: "sandbox".to_string(),
            project_name: "proj".to_string(),
            connect_timeout: 5,
        }
    }

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
    }

    #[test]
    fn test_args_layout() {
        let target = target();
        let excludes = ExcludePatterns::parse(".git *.swp docs/internal");
        let extra = vec!["--compress".to_string()];
        let plan = RsyncPlan {
            target: &target,
            project_root: Path::new("/home/me/My Project"),
            files_from: Path::new("/home/me/My Project/.vmsync/tracked_files"),
            excludes: &excludes,
            extra_args: &extra,
            options: PushOptions {
                dry_run: true,
                delete: false,
                verbose: false,
            },
        };

        let args = strings(&plan.args(Path::new("/usr/bin/ssh")));
        assert_eq!(&args[..3], &["-a", "-r", "--relative"]);
        assert_eq!(
            args[3],
            "--files-from=/home/me/My Project/.vmsync/tracked_files"
        );
        assert_eq!(args[4], "--exclude=*.swp");
        assert_eq!(args[5], "--exclude=.git");
        assert_eq!(args[6], "--exclude=/docs/internal");
        assert_eq!(args[7], "--exclude=/.vmsync/");
        assert_eq!(args[8], "-e");
        assert!(
            args[9].starts_with("/usr/bin/ssh -i '/home/me/My Project/.vmsync/id_ed25519' -p 2222 -o "),
            "{}",
            args[9]
        );
        assert_eq!(shell_words::split(&args[9]).unwrap().len(), 9);
        assert!(args[9].contains("BatchMode=yes"));
        assert!(args.contains(&"--dry-run".to_string()));
        assert!(!args.contains(&"--delete".to_string()));
        assert_eq!(args[args.len() - 3], "--compress");
        assert_eq!(args[args.len() - 2], "/home/me/My Project/");
        assert_eq!(args[args.len() - 1], "dev@vm:sandbox/proj/");
    }
}
