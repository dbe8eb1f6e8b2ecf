//! # Remote side: ssh, rsync and friends
//!
//! vmsync never talks to the VM itself. Everything goes through the system
//! binaries:
//!
//! ```text
//! ┌──────────────┐  ping / ssh-keygen / ssh-copy-id  ┌──────────────────────┐
//! │ project root │ ────────────────────────────────> │ user@vm              │
//! │  .vmsync/    │  rsync -a --files-from -e ssh     │  <remote_dir>/<name> │
//! └──────────────┘ ────────────────────────────────> └──────────────────────┘
//! ```
//!
//! Failures keep the tool's native exit code (see [`ToolExit`]); ssh failures
//! are additionally categorized from stderr (see [`SshError`]).

/// Tool failure types
pub mod errors;
/// rsync argument building and push
pub mod rsync;
/// ssh, ssh-keygen, ssh-copy-id and ping wrappers
pub mod ssh;
/// Locating and running external programs
pub mod tools;

pub use errors::{SshError, ToolExit};
pub use tools::{Tool, ToolRunner};

use crate::config::Config;
use crate::settings::{Settings, keys};
use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Everything needed to reach a project's sandbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    /// `[user@]host`
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Absolute path of the private key
    pub key_path: PathBuf,
    /// Remote base directory
    pub remote_dir: String,
    /// Sandbox directory name below `remote_dir`
    pub project_name: String,
    /// Seconds before ping/ssh give up
    pub connect_timeout: u32,
}

impl RemoteTarget {
    /// Reads the target from project settings
    ///
    /// `remote_host`, `remote_dir`, `project_name` and `ssh_key` are required;
    /// `remote_port` falls back to the configured default.
    ///
    /// # Errors
    ///
    /// Returns an error if a required setting is missing or ambiguous, or a
    /// value is malformed.
    pub fn from_settings(settings: &Settings, settings_dir: &Path, config: &Config) -> Result<Self> {
        let host = settings.get(keys::REMOTE_HOST)?.to_string();
        validate_host(&host)?;

        let port = match settings.get_optional(keys::REMOTE_PORT)? {
            Some(value) => parse_port(value)?,
            None => config.ssh.port,
        };

        let remote_dir = settings.get(keys::REMOTE_DIR)?.to_string();
        let project_name = settings.get(keys::PROJECT_NAME)?.to_string();
        validate_project_name(&project_name)?;

        let key = PathBuf::from(settings.get(keys::SSH_KEY)?);
        let key_path = if key.is_absolute() {
            key
        } else {
            settings_dir.join(key)
        };

        Ok(Self {
            host,
            port,
            key_path,
            remote_dir,
            project_name,
            connect_timeout: config.ssh.connect_timeout,
        })
    }

    /// Host name without the `user@` part
    #[must_use]
    pub fn hostname(&self) -> &str {
        hostname_of(&self.host)
    }

    /// Public key path
    #[must_use]
    pub fn public_key_path(&self) -> PathBuf {
        let mut path = self.key_path.clone().into_os_string();
        path.push(".pub");
        PathBuf::from(path)
    }

    /// Sandbox directory on the remote host
    ///
    /// A leading `~/` is dropped: ssh and rsync already resolve relative
    /// paths against the remote home directory, and the path gets quoted.
    #[must_use]
    pub fn sandbox_dir(&self) -> String {
        let base = self.remote_dir.trim_end_matches('/');
        let base = base
            .strip_prefix("~/")
            .or_else(|| (base == "~").then_some(""))
            .unwrap_or(base);
        if base.is_empty() {
            self.project_name.clone()
        } else {
            format!("{base}/{}", self.project_name)
        }
    }

    /// rsync destination, `host:sandbox/`
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}:{}/", self.host, self.sandbox_dir())
    }

    /// Options shared by every ssh invocation
    #[must_use]
    pub fn ssh_options(&self) -> Vec<OsString> {
        vec![
            "-i".into(),
            self.key_path.clone().into(),
            "-p".into(),
            self.port.to_string().into(),
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.connect_timeout).into(),
        ]
    }
}

/// Host name part of `[user@]host`
#[must_use]
pub fn hostname_of(host: &str) -> &str {
    host.rsplit_once('@').map_or(host, |(_, name)| name)
}

/// Checks a `[user@]host` string
///
/// # Errors
///
/// Returns an error for empty hosts, whitespace, or a leading `-`.
pub fn validate_host(host: &str) -> Result<()> {
    let name = hostname_of(host);
    if name.is_empty() || host.chars().any(char::is_whitespace) || host.starts_with('-') {
        bail!("Invalid remote host '{host}': expected [user@]host");
    }
    Ok(())
}

/// Parses an SSH port number
///
/// # Errors
///
/// Returns an error unless the value is in `1..=65535`.
pub fn parse_port(value: &str) -> Result<u16> {
    let port: u16 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid port: {value}"))?;
    if port == 0 {
        bail!("Invalid port: {value}");
    }
    Ok(port)
}

/// Checks a sandbox directory name
///
/// # Errors
///
/// Returns an error for empty names, `.`/`..`, names with `/` or whitespace.
pub fn validate_project_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.chars().any(char::is_whitespace)
    {
        bail!("Invalid project name '{name}': use a single directory name without spaces");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(text: &str) -> Settings {
        Settings::parse(PathBuf::from("settings"), text)
    }

    fn target(remote_dir: &str) -> RemoteTarget {
        RemoteTarget {
            host: "dev@vm".to_string(),
            port: 22,
            key_path: PathBuf::from("/p/.vmsync/id_ed25519"),
            remote_dir: remote_dir.to_string(),
            project_name: "proj".to_string(),
            connect_timeout: 5,
        }
    }

    #[test]
    fn test_from_settings() -> Result<()> {
        let config = Config::default();
        let s = settings(
            "remote_host = dev@vm\nremote_dir = sandbox\nproject_name = proj\nssh_key = id_ed25519\n",
        );
        let target = RemoteTarget::from_settings(&s, Path::new("/p/.vmsync"), &config)?;
        assert_eq!(target.port, 22);
        assert_eq!(target.key_path, PathBuf::from("/p/.vmsync/id_ed25519"));
        assert_eq!(target.public_key_path(), PathBuf::from("/p/.vmsync/id_ed25519.pub"));
        assert_eq!(target.hostname(), "vm");
        assert_eq!(target.destination(), "dev@vm:sandbox/proj/");
        Ok(())
    }

    #[test]
    fn test_from_settings_missing_host() {
        let config = Config::default();
        let s = settings("remote_dir = sandbox\n");
        let err = RemoteTarget::from_settings(&s, Path::new("/p/.vmsync"), &config).unwrap_err();
        assert!(err.to_string().contains("remote_host"));
    }

    #[test]
    fn test_from_settings_port_override() -> Result<()> {
        let config = Config::default();
        let s = settings(
            "remote_host = vm\nremote_port = 2222\nremote_dir = /srv\nproject_name = p\nssh_key = /k/id\n",
        );
        let target = RemoteTarget::from_settings(&s, Path::new("/p/.vmsync"), &config)?;
        assert_eq!(target.port, 2222);
        assert_eq!(target.key_path, PathBuf::from("/k/id"));
        assert_eq!(target.hostname(), "vm");
        Ok(())
    }

    #[test]
    fn test_sandbox_dir() {
        assert_eq!(target("sandbox").sandbox_dir(), "sandbox/proj");
        assert_eq!(target("/srv/vm/").sandbox_dir(), "/srv/vm/proj");
        assert_eq!(target("~/work").sandbox_dir(), "work/proj");
        assert_eq!(target("~").sandbox_dir(), "proj");
    }

    #[test]
    fn test_validation() {
        assert!(validate_host("dev@vm.local").is_ok());
        assert!(validate_host("vm").is_ok());
        assert!(validate_host("dev@").is_err());
        assert!(validate_host("-oProxyCommand=x").is_err());
        assert!(validate_host("a b").is_err());

        assert!(parse_port("22").is_ok());
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000").is_err());

        assert!(validate_project_name("proj").is_ok());
        assert!(validate_project_name("..").is_err());
        assert!(validate_project_name("a/b").is_err());
    }
}
