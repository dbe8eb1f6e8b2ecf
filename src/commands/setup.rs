use crate::commands::context::CommandContext;
use crate::remote::{hostname_of, ssh, validate_host, validate_project_name};
use crate::settings::{Settings, keys};
use crate::tracking::{ExcludePatterns, TrackedList};
use crate::utils::compact_timestamp;
use crate::{SETTINGS_DIR, VmsyncContext};
use anyhow::{Context, Result, bail};
use chrono::Utc;
use colored::Colorize;
use std::path::Path;

/// Arguments of `vmsync setup`
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// `[user@]host` of the test VM
    pub host: String,
    /// Remote base directory; the configured `remote.base_dir` when `None`
    pub remote_dir: Option<String>,
    /// SSH port; the configured `ssh.port` when `None`
    pub port: Option<u16>,
    /// Sandbox directory name; the project directory name when `None`
    pub name: Option<String>,
    /// Provision again over an existing settings folder
    pub force: bool,
}

/// Provision a project: key pair, key install, remote sandbox, settings
///
/// An existing key pair in the settings folder is reused, so `--force` can
/// re-install a key the VM lost without changing its comment.
///
/// # Errors
///
/// Returns an error if:
/// - The project is already set up and `force` is not given
/// - The host is unreachable
/// - Any of ssh-keygen, ssh-copy-id or the remote mkdir fails
/// - The settings cannot be written
pub fn execute(ctx: &VmsyncContext, opts: &SetupOptions) -> Result<()> {
    validate_host(&opts.host)?;
    let name = match &opts.name {
        Some(name) => name.clone(),
        None => default_project_name(&ctx.project_root)?,
    };
    validate_project_name(&name)?;
    let remote_dir = opts
        .remote_dir
        .clone()
        .unwrap_or_else(|| ctx.config.remote.base_dir.clone());
    if remote_dir.trim().is_empty() {
        bail!("Remote directory cannot be empty");
    }
    let port = opts.port.unwrap_or(ctx.config.ssh.port);

    if ctx.is_initialized() && !opts.force {
        bail!(
            "vmsync is already set up in {} (use --force to provision again)",
            ctx.project_root.display()
        );
    }

    let runner = ctx.tool_runner();
    ssh::check_reachable(
        &runner,
        hostname_of(&opts.host),
        ctx.config.ssh.connect_timeout,
    )?;

    ctx.ensure_settings_dir()?;
    let mut settings = if ctx.settings_path().exists() {
        ctx.load_settings()?
    } else {
        Settings::empty(ctx.settings_path())
    };

    let key_type = ctx.config.ssh.key_type;
    let key_name = match existing_key(ctx, &settings)? {
        Some(name) => {
            if name != key_type.file_name() {
                super::print_warning(&format!(
                    "Keeping existing key {name}; ssh.key_type = {key_type} applies to new keys only"
                ));
            }
            name
        }
        None => key_type.file_name(),
    };
    let key_path = ctx.settings_dir().join(&key_name);
    let comment = if key_path.exists() {
        let comment = existing_comment(&settings, &key_path)?;
        super::print_info(&format!("Reusing SSH key {}", key_path.display()));
        comment
    } else {
        let comment = key_comment(&name, &compact_timestamp(Utc::now()));
        ssh::generate_key(&runner, &key_path, key_type, &comment)?;
        crate::output::action("generated", &format!("{key_type} key {}", key_path.display()));
        comment
    };

    settings.set(keys::REMOTE_HOST, &opts.host)?;
    settings.set(keys::REMOTE_PORT, &port.to_string())?;
    settings.set(keys::REMOTE_DIR, &remote_dir)?;
    settings.set(keys::PROJECT_NAME, &name)?;
    settings.set(keys::SSH_KEY, &key_name)?;
    settings.set(keys::KEY_COMMENT, &comment)?;
    if settings.get_optional(keys::EXCLUDED_FILES)?.is_none() {
        let excludes = ExcludePatterns::from_patterns(&ctx.config.tracking.default_excludes)
            .context("Invalid tracking.default_excludes in the vmsync config")?;
        settings.set(keys::EXCLUDED_FILES, &excludes.to_setting_value())?;
    }

    let target = ctx.remote_target(&settings)?;
    super::print_info(&format!(
        "Installing the public key on {} (you may be asked for the VM password)",
        target.host
    ));
    ssh::copy_id(&runner, &target)?;
    ssh::make_sandbox(&runner, &target)?;
    crate::output::action("created", &target.destination());

    // Written last so a failed provisioning leaves the project unconfigured
    settings.save()?;
    if !ctx.tracked_path().exists() {
        TrackedList::new().save(&ctx.tracked_path())?;
    }
    tracing::info!(host = %target.host, sandbox = %target.sandbox_dir(), "project set up");

    super::print_success(&format!(
        "Set up {} -> {}",
        ctx.project_root.display(),
        target.destination()
    ));
    if crate::output::get_verbosity() != crate::output::Verbosity::Quiet {
        eprintln!("\n{}", "Quick start:".bold());
        eprintln!("  vmsync add src Cargo.toml   # Track files and directories");
        eprintln!("  vmsync status               # Check what is tracked");
        eprintln!("  vmsync push                 # Copy them to the VM");
    }

    Ok(())
}

/// Sandbox name derived from the project directory
fn default_project_name(root: &Path) -> Result<String> {
    root.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| {
            format!(
                "Cannot derive a project name from {}; pass --name",
                root.display()
            )
        })
}

/// Unique comment for a generated key, restricted to `[A-Za-z0-9._-]`
fn key_comment(project_name: &str, stamp: &str) -> String {
    let name: String = project_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("vmsync-{name}-{stamp}")
}

/// Key file recorded by an earlier setup, if it is still in the settings folder
fn existing_key(ctx: &VmsyncContext, settings: &Settings) -> Result<Option<String>> {
    let Some(name) = settings.get_optional(keys::SSH_KEY)? else {
        return Ok(None);
    };
    let plain = Path::new(name).file_name().is_some_and(|n| n == name);
    Ok((plain && ctx.settings_dir().join(name).is_file()).then(|| name.to_string()))
}

/// Comment of a key generated by an earlier setup
fn existing_comment(settings: &Settings, key_path: &Path) -> Result<String> {
    if let Some(comment) = settings.get_optional(keys::KEY_COMMENT)? {
        return Ok(comment.to_string());
    }
    let mut public = key_path.as_os_str().to_owned();
    public.push(".pub");
    let content = std::fs::read_to_string(&public)
        .with_context(|| format!("Failed to read public key: {}", Path::new(&public).display()))?;
    match content.split_whitespace().nth(2) {
        Some(comment) => Ok(comment.to_string()),
        None => bail!(
            "Public key {} has no comment; delete the key pair in {SETTINGS_DIR}/ and run setup again",
            Path::new(&public).display()
        ),
    }
}
