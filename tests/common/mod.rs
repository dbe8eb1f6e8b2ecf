#![allow(dead_code)]

use anyhow::Result;
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test project fixture: a project directory plus a config whose external
/// tools are harmless stand-ins
pub struct TestProject {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub config_path: PathBuf,
}

impl TestProject {
    /// Create a project directory that has not been set up yet
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("project");
        fs::create_dir_all(&root)?;
        let config_path = temp_dir.path().join("vmsync.toml");

        let project = Self {
            temp_dir,
            root,
            config_path,
        };
        let keygen = project.script(
            "fake-ssh-keygen",
            "for a; do last=\"$a\"; done\necho private > \"$last\"\necho \"ssh-ed25519 AAAA fake\" > \"$last.pub\"\n",
        )?;
        project.write_config(&format!(
            "[tools]\nssh = \"true\"\nssh_keygen = \"{}\"\nssh_copy_id = \"true\"\nrsync = \"true\"\nping = \"true\"\n",
            keygen.display()
        ))?;
        Ok(project)
    }

    /// Create a project and run `vmsync setup` in it
    pub fn set_up() -> Result<Self> {
        let project = Self::new()?;
        project
            .cmd()
            .args(["setup", "dev@testvm"])
            .assert()
            .success();
        Ok(project)
    }

    /// Command running the binary inside the project
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("vmsync").expect("vmsync binary");
        cmd.current_dir(&self.root)
            .env("VMSYNC_CONFIG_PATH", &self.config_path)
            .env("HOME", self.temp_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn write_config(&self, content: &str) -> Result<()> {
        fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Executable shell script in the temp directory
    pub fn script(&self, name: &str, body: &str) -> Result<PathBuf> {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}"))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        }
        Ok(path)
    }

    pub fn create_file(&self, name: &str, content: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.root.join(".vmsync")
    }

    pub fn tracked(&self) -> Result<String> {
        Ok(fs::read_to_string(self.settings_dir().join("tracked_files"))?)
    }

    pub fn settings(&self) -> Result<String> {
        Ok(fs::read_to_string(self.settings_dir().join("settings"))?)
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}
