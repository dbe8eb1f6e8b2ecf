//! Locating and running the external tool chain.

use super::errors::ToolExit;
use crate::config::ToolsConfig;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

/// External programs vmsync delegates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    /// `ssh`
    Ssh,
    /// `ssh-keygen`
    SshKeygen,
    /// `ssh-copy-id`
    SshCopyId,
    /// `rsync`
    Rsync,
    /// `ping`
    Ping,
}

impl Tool {
    /// Canonical program name
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::SshKeygen => "ssh-keygen",
            Self::SshCopyId => "ssh-copy-id",
            Self::Rsync => "rsync",
            Self::Ping => "ping",
        }
    }

    /// Key of the `[tools]` config entry overriding this program
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::SshKeygen => "ssh_keygen",
            Self::SshCopyId => "ssh_copy_id",
            Self::Rsync => "rsync",
            Self::Ping => "ping",
        }
    }

    /// Configured program for this tool
    fn program(self, tools: &ToolsConfig) -> &str {
        match self {
            Self::Ssh => &tools.ssh,
            Self::SshKeygen => &tools.ssh_keygen,
            Self::SshCopyId => &tools.ssh_copy_id,
            Self::Rsync => &tools.rsync,
            Self::Ping => &tools.ping,
        }
    }
}

/// Runs tools configured in the `[tools]` section
#[derive(Debug, Clone, Copy)]
pub struct ToolRunner<'a> {
    /// Program overrides
    tools: &'a ToolsConfig,
}

impl<'a> ToolRunner<'a> {
    /// Create a runner for the given tool configuration
    #[must_use]
    pub const fn new(tools: &'a ToolsConfig) -> Self {
        Self { tools }
    }

    /// Resolves a tool to an executable path through `PATH`
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be found.
    pub fn resolve(&self, tool: Tool) -> Result<PathBuf> {
        let program = tool.program(self.tools);
        which::which(program).with_context(|| {
            format!(
                "{} not found (looked for '{program}'); install it or set tools.{} in the vmsync config",
                tool.name(),
                tool.config_key()
            )
        })
    }

    /// Builds a command for `tool` with `args`
    fn command(&self, tool: Tool, args: &[OsString]) -> Result<Command> {
        let path = self.resolve(tool)?;
        tracing::debug!(tool = tool.name(), program = %path.display(), ?args, "running");
        let mut cmd = Command::new(path);
        cmd.args(args);
        Ok(cmd)
    }

    /// Runs with inherited stdio and fails with [`ToolExit`] on a non-zero exit
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started or exits unsuccessfully.
    pub fn run(&self, tool: Tool, args: &[OsString]) -> Result<()> {
        let status = self
            .command(tool, args)?
            .status()
            .with_context(|| format!("Failed to launch {}", tool.name()))?;
        tracing::debug!(tool = tool.name(), %status, "finished");

        if status.success() {
            Ok(())
        } else {
            Err(ToolExit {
                tool: tool.name().to_string(),
                code: status.code(),
            }
            .into())
        }
    }

    /// Runs with stdin closed and stdout/stderr captured
    ///
    /// The caller decides what a non-zero exit means.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started.
    pub fn capture(&self, tool: Tool, args: &[OsString]) -> Result<Output> {
        let output = self
            .command(tool, args)?
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to launch {}", tool.name()))?;
        tracing::debug!(tool = tool.name(), status = %output.status, "finished");
        Ok(output)
    }

    /// Runs with all stdio discarded and reports whether it succeeded
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be started.
    pub fn probe(&self, tool: Tool, args: &[OsString]) -> Result<bool> {
        let status = self
            .command(tool, args)?
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("Failed to launch {}", tool.name()))?;
        tracing::debug!(tool = tool.name(), %status, "finished");
        Ok(status.success())
    }
}

/// Converts a failed captured run into a [`ToolExit`]
#[must_use]
pub fn exit_of(tool: Tool, output: &Output) -> ToolExit {
    ToolExit {
        tool: tool.name().to_string(),
        code: output.status.code(),
    }
}
