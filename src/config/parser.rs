use super::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Reads, parses and validates a configuration file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid TOML, or holds
/// out-of-range values.
pub fn parse_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config_str(&content)
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns an error if the text is not valid TOML or fails validation.
pub fn parse_config_str(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).context("Failed to parse TOML config")?;

    // Validate and return validation errors directly without wrapping
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<()> {
    if config.ssh.port == 0 {
        anyhow::bail!("ssh.port must be between 1 and 65535");
    }

    if config.ssh.connect_timeout == 0 {
        anyhow::bail!("ssh.connect_timeout must be at least 1 second");
    }

    if config.remote.base_dir.trim().is_empty() {
        anyhow::bail!("remote.base_dir cannot be empty");
    }

    for (name, value) in [
        ("ssh", &config.tools.ssh),
        ("ssh_keygen", &config.tools.ssh_keygen),
        ("ssh_copy_id", &config.tools.ssh_copy_id),
        ("rsync", &config.tools.rsync),
        ("ping", &config.tools.ping),
    ] {
        if value.trim().is_empty() {
            anyhow::bail!("tools.{name} cannot be empty");
        }
    }

    for pattern in &config.tracking.default_excludes {
        if pattern.is_empty() || pattern.chars().any(char::is_whitespace) {
            anyhow::bail!("tracking.default_excludes: invalid pattern '{pattern}'");
        }
    }

    Ok(())
}
