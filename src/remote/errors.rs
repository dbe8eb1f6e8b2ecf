use std::fmt;

/// An external tool exited unsuccessfully.
///
/// `main` looks for this in the error chain and exits with `code`, so callers
/// see the tool's own exit status (rsync's 23, ssh's 255, ...) unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExit {
    /// Program name as invoked.
    pub tool: String,
    /// Exit code; `None` when the process was killed by a signal.
    pub code: Option<i32>,
}

impl ToolExit {
    /// Exit code to hand back to the shell.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.unwrap_or(1)
    }
}

impl fmt::Display for ToolExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} exited with status {code}", self.tool),
            None => write!(f, "{} was terminated by a signal", self.tool),
        }
    }
}

impl std::error::Error for ToolExit {}

/// Categorized ssh failures with actionable guidance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SshError {
    /// DNS, routing or connection failures
    Network(String),
    /// Key or password rejected
    Authentication(String),
    /// Remote host key mismatch or unknown host in batch mode
    HostKey(String),
    /// Remote command hit a filesystem permission problem
    Permission(String),
    /// Anything else
    Unknown(String),
}

impl SshError {
    /// Parse ssh stderr to categorize the error
    #[must_use]
    pub fn from_stderr(command: &str, stderr: &str) -> Self {
        let stderr_lower = stderr.to_lowercase();
        let detail = extract_meaningful_message(stderr);

        if stderr_lower.contains("could not resolve hostname")
            || stderr_lower.contains("connection timed out")
            || stderr_lower.contains("network is unreachable")
            || stderr_lower.contains("no route to host")
            || stderr_lower.contains("connection refused")
            || stderr_lower.contains("connection closed")
        {
            return Self::Network(format!("{command}: Network error - {detail}"));
        }

        if stderr_lower.contains("host key verification failed")
            || stderr_lower.contains("remote host identification has changed")
        {
            return Self::HostKey(format!("{command}: Host key problem - {detail}"));
        }

        if stderr_lower.contains("permission denied (publickey")
            || stderr_lower.contains("too many authentication failures")
            || stderr_lower.contains("authentication failed")
        {
            return Self::Authentication(format!("{command}: Authentication failed - {detail}"));
        }

        if stderr_lower.contains("permission denied")
            || stderr_lower.contains("read-only file system")
            || stderr_lower.contains("operation not permitted")
        {
            return Self::Permission(format!("{command}: Permission error - {detail}"));
        }

        Self::Unknown(format!("{command}: {detail}"))
    }

    /// Get a user-friendly error message with actionable guidance
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Network(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Check that the VM is running and reachable\n\
                 - Verify remote_host and remote_port (vmsync config --list)"
            ),
            Self::Authentication(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Re-install the key with 'vmsync setup --force <host>'\n\
                 - Check that the ssh_key setting points at the generated key"
            ),
            Self::HostKey(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - If the VM was rebuilt, remove its old entry with 'ssh-keygen -R <host>'\n\
                 - Connect once with plain ssh to accept the new host key"
            ),
            Self::Permission(msg) => format!(
                "{msg}\n\nSuggestions:\n\
                 - Check that the remote user can write to remote_dir"
            ),
            Self::Unknown(msg) => msg.clone(),
        }
    }
}

impl fmt::Display for SshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.user_message())
    }
}

impl std::error::Error for SshError {}

/// Extract the most meaningful part of the error message
fn extract_meaningful_message(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("Warning: Permanently added"))
        .take(3)
        .collect();

    if lines.is_empty() {
        return "No error details available".to_string();
    }

    lines.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_detection() {
        let stderr = "ssh: Could not resolve hostname devvm: Name or service not known";
        let error = SshError::from_stderr("ssh devvm", stderr);
        assert!(matches!(error, SshError::Network(_)));
    }

    #[test]
    fn test_auth_error_detection() {
        let stderr = "dev@vm: Permission denied (publickey,password).";
        let error = SshError::from_stderr("ssh dev@vm", stderr);
        assert!(matches!(error, SshError::Authentication(_)));
        assert!(error.to_string().contains("setup --force"));
    }

    #[test]
    fn test_host_key_error_detection() {
        let stderr = "@@@@@@@@\nWARNING: REMOTE HOST IDENTIFICATION HAS CHANGED!\nHost key verification failed.";
        let error = SshError::from_stderr("ssh vm", stderr);
        assert!(matches!(error, SshError::HostKey(_)));
    }

    #[test]
    fn test_remote_permission_error_detection() {
        let stderr = "mkdir: cannot create directory '/srv/sandbox': Permission denied";
        let error = SshError::from_stderr("ssh vm", stderr);
        assert!(matches!(error, SshError::Permission(_)));
    }

    #[test]
    fn test_empty_stderr() {
        let error = SshError::from_stderr("ssh vm", "\n\n");
        assert_eq!(error.to_string(), "ssh vm: No error details available");
    }

    #[test]
    fn test_tool_exit_display() {
        let exit = ToolExit {
            tool: "rsync".to_string(),
            code: Some(23),
        };
        assert_eq!(exit.to_string(), "rsync exited with status 23");
        assert_eq!(exit.exit_code(), 23);

        let killed = ToolExit {
            tool: "ssh".to_string(),
            code: None,
        };
        assert_eq!(killed.exit_code(), 1);
    }
}
