use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

/// Flags configuration keys vmsync does not know about
pub struct ConfigValidator {
    /// Set of valid configuration fields
    known_fields: HashSet<&'static str>,
}

impl ConfigValidator {
    /// Create a new validator with known configuration fields
    #[must_use]
    pub fn new() -> Self {
        let known_fields = [
            "ssh",
            "ssh.key_type",
            "ssh.port",
            "ssh.connect_timeout",
            "remote",
            "remote.base_dir",
            "rsync",
            "rsync.extra_args",
            "tracking",
            "tracking.default_excludes",
            "tools",
            "tools.ssh",
            "tools.ssh_keygen",
            "tools.ssh_copy_id",
            "tools.rsync",
            "tools.ping",
        ]
        .into_iter()
        .collect();

        Self { known_fields }
    }

    /// Validate a configuration file and warn about unknown fields
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn validate_config_file(&self, config_path: &Path) -> Result<()> {
        if !config_path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(config_path)?;
        let unknown = self.unknown_fields(&content)?;

        if !unknown.is_empty() {
            eprintln!("{}", "Configuration warnings:".yellow().bold());
            for field in unknown {
                eprintln!("  Unknown configuration field: {}", field.yellow());
            }
            eprintln!();
        }

        Ok(())
    }

    /// Returns the dotted paths of all unknown fields in `content`
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not valid TOML
    pub fn unknown_fields(&self, content: &str) -> Result<Vec<String>> {
        let parsed: toml::Table = toml::from_str(content)?;
        let mut unknown = Vec::new();
        self.check_table(&parsed, "", &mut unknown);
        Ok(unknown)
    }

    /// Recursively checks a TOML table for unknown fields
    fn check_table(&self, table: &toml::Table, prefix: &str, unknown: &mut Vec<String>) {
        for (key, value) in table {
            let full_key = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };

            if !self.known_fields.contains(full_key.as_str()) {
                unknown.push(full_key);
            } else if let toml::Value::Table(nested) = value {
                self.check_table(nested, &full_key, unknown);
            }
        }
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}
