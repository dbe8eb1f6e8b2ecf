//! Global user configuration.
//!
//! Stored as TOML at `~/.config/vmsync/config.toml`. Every field has a
//! default, so a missing file or a partial one both work. Per-project state
//! lives in the flat settings file instead (see [`crate::settings`]).

pub mod parser;
pub mod validator;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub rsync: RsyncConfig,

    #[serde(default)]
    pub tracking: TrackingConfig,

    /// External programs, resolved through `PATH` when not absolute
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_key_type")]
    pub key_type: KeyType,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Seconds, used for both `ping -W` and `ssh -o ConnectTimeout`
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Ed25519,
    Rsa,
    Ecdsa,
}

impl KeyType {
    /// Value for `ssh-keygen -t`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Rsa => "rsa",
            Self::Ecdsa => "ecdsa",
        }
    }

    /// Conventional private key file name
    #[must_use]
    pub fn file_name(self) -> String {
        format!("id_{}", self.as_str())
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Default `remote_dir` for `vmsync setup`
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RsyncConfig {
    /// Appended to every rsync invocation
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Seeds `excluded_files` at setup
    #[serde(default = "default_excludes")]
    pub default_excludes: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ssh")]
    pub ssh: String,
    #[serde(default = "default_ssh_keygen")]
    pub ssh_keygen: String,
    #[serde(default = "default_ssh_copy_id")]
    pub ssh_copy_id: String,
    #[serde(default = "default_rsync")]
    pub rsync: String,
    #[serde(default = "default_ping")]
    pub ping: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            key_type: default_key_type(),
            port: default_port(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            default_excludes: default_excludes(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ssh: default_ssh(),
            ssh_keygen: default_ssh_keygen(),
            ssh_copy_id: default_ssh_copy_id(),
            rsync: default_rsync(),
            ping: default_ping(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML or invalid values
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            // Create default config if it doesn't exist
            let config = Self::default();
            config.save(path)?;
            tracing::debug!(path = %path.display(), "created default configuration");
            return Ok(config);
        }

        parser::parse_config_file(path)
    }

    /// Save configuration to a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(toml_str.as_bytes())?;
        Ok(())
    }
}

// Default functions for serde
const fn default_key_type() -> KeyType {
    KeyType::Ed25519
}

const fn default_port() -> u16 {
    22
}

const fn default_connect_timeout() -> u32 {
    5
}

fn default_base_dir() -> String {
    "sandbox".to_string()
}

fn default_excludes() -> Vec<String> {
    [".git", ".vmsync", "target", "node_modules", "*.swp"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_ssh() -> String {
    "ssh".to_string()
}

fn default_ssh_keygen() -> String {
    "ssh-keygen".to_string()
}

fn default_ssh_copy_id() -> String {
    "ssh-copy-id".to_string()
}

fn default_rsync() -> String {
    "rsync".to_string()
}

fn default_ping() -> String {
    "ping".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_creates_default() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested/config.toml");
        let config = Config::load(&path)?;

        assert!(path.exists());
        assert_eq!(config.ssh.port, 22);
        assert_eq!(config.ssh.key_type, KeyType::Ed25519);
        assert!(config.tracking.default_excludes.contains(&".git".to_string()));
        Ok(())
    }

    #[test]
    fn test_partial_file_uses_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ssh]\nport = 2222\n\n[tools]\nrsync = \"/opt/bin/rsync\"\n")?;

        let config = Config::load(&path)?;
        assert_eq!(config.ssh.port, 2222);
        assert_eq!(config.ssh.connect_timeout, 5);
        assert_eq!(config.tools.rsync, "/opt/bin/rsync");
        assert_eq!(config.tools.ssh, "ssh");
        Ok(())
    }

    #[test]
    fn test_key_type_file_name() {
        assert_eq!(KeyType::Ed25519.file_name(), "id_ed25519");
        assert_eq!(KeyType::Rsa.to_string(), "rsa");
    }
}
