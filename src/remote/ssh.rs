use super::errors::SshError;
use super::tools::{Tool, ToolRunner, exit_of};
use super::RemoteTarget;
use crate::config::KeyType;
use anyhow::{Context, Result, bail};
use std::ffi::OsString;
use std::path::Path;

/// Checks that `hostname` answers a single ping
///
/// # Errors
///
/// Returns an error if ping cannot be run or the host does not answer.
pub fn check_reachable(runner: &ToolRunner<'_>, hostname: &str, timeout: u32) -> Result<()> {
    let args: Vec<OsString> = vec![
        "-c".into(),
        "1".into(),
        "-W".into(),
        timeout.to_string().into(),
        hostname.into(),
    ];
    if !runner.probe(Tool::Ping, &args)? {
        bail!("Server unreachable: {hostname} did not answer ping within {timeout}s");
    }
    tracing::info!(host = hostname, "server reachable");
    Ok(())
}

/// Generates a passphrase-less key pair at `key_path`
///
/// # Errors
///
/// Returns an error if ssh-keygen fails.
pub fn generate_key(
    runner: &ToolRunner<'_>,
    key_path: &Path,
    key_type: KeyType,
    comment: &str,
) -> Result<()> {
    let mut args: Vec<OsString> = vec!["-q".into(), "-t".into(), key_type.as_str().into()];
    if key_type == KeyType::Rsa {
        args.extend(["-b".into(), "4096".into()]);
    }
    args.extend([
        "-N".into(),
        "".into(),
        "-C".into(),
        comment.into(),
        "-f".into(),
        key_path.as_os_str().to_owned(),
    ]);

    let output = runner.capture(Tool::SshKeygen, &args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow::Error::new(exit_of(Tool::SshKeygen, &output)))
            .with_context(|| format!("Failed to generate SSH key: {}", stderr.trim()));
    }
    Ok(())
}

/// Installs the public key on the remote host with ssh-copy-id
///
/// Runs interactively so the user can type the VM password.
///
/// # Errors
///
/// Returns an error if ssh-copy-id fails.
pub fn copy_id(runner: &ToolRunner<'_>, target: &RemoteTarget) -> Result<()> {
    let args: Vec<OsString> = vec![
        "-i".into(),
        target.public_key_path().into(),
        "-p".into(),
        target.port.to_string().into(),
        "-o".into(),
        format!("ConnectTimeout={}", target.connect_timeout).into(),
        target.host.clone().into(),
    ];
    runner
        .run(Tool::SshCopyId, &args)
        .with_context(|| format!("Failed to install the SSH key on {}", target.host))
}

/// Runs `command` through the remote shell and returns its stdout
///
/// # Errors
///
/// Returns an error carrying ssh's exit code, with the stderr categorized as
/// an [`SshError`].
pub fn run_remote(runner: &ToolRunner<'_>, target: &RemoteTarget, command: &str) -> Result<String> {
    let mut args = target.ssh_options();
    args.push(target.host.clone().into());
    args.push(command.into());

    let output = runner.capture(Tool::Ssh, &args)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let label = format!("ssh {}", target.host);
        return Err(anyhow::Error::new(exit_of(Tool::Ssh, &output))
            .context(SshError::from_stderr(&label, &stderr)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Remote command creating the sandbox directory
#[must_use]
pub fn mkdir_command(target: &RemoteTarget) -> String {
    format!("mkdir -p -- {}", shell_words::quote(&target.sandbox_dir()))
}

/// Remote command deleting the sandbox directory
#[must_use]
pub fn rmdir_command(target: &RemoteTarget) -> String {
    format!("rm -rf -- {}", shell_words::quote(&target.sandbox_dir()))
}

/// Remote command deleting the authorized_keys line carrying `comment`
///
/// # Errors
///
/// Returns an error if the comment contains characters outside
/// `[A-Za-z0-9._-]`, which would need regex escaping.
pub fn unauthorize_command(comment: &str) -> Result<String> {
    if comment.is_empty()
        || !comment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        bail!("Refusing to remove key with unexpected comment '{comment}'");
    }
    let regex = comment.replace('.', "\\.");
    let script = format!("/ {regex}$/d");
    Ok(format!(
        "f=\"$HOME/.ssh/authorized_keys\"; [ -f \"$f\" ] || exit 0; sed -i.vmsync-bak {} \"$f\" && rm -f \"$f.vmsync-bak\"",
        shell_words::quote(&script)
    ))
}

/// Creates the sandbox directory on the remote host
///
/// # Errors
///
/// Returns an error if the remote command fails.
pub fn make_sandbox(runner: &ToolRunner<'_>, target: &RemoteTarget) -> Result<()> {
    run_remote(runner, target, &mkdir_command(target))?;
    Ok(())
}

/// Deletes the sandbox directory on the remote host
///
/// # Errors
///
/// Returns an error if the remote command fails.
pub fn remove_sandbox(runner: &ToolRunner<'_>, target: &RemoteTarget) -> Result<()> {
    run_remote(runner, target, &rmdir_command(target))?;
    Ok(())
}

/// Removes the installed public key from the remote authorized_keys
///
/// # Errors
///
/// Returns an error if the comment is malformed or the remote command fails.
pub fn remove_authorized_key(
    runner: &ToolRunner<'_>,
    target: &RemoteTarget,
    comment: &str,
) -> Result<()> {
    run_remote(runner, target, &unauthorize_command(comment)?)?;
    Ok(())
}
