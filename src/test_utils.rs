#[cfg(test)]
pub mod fixtures {
    use crate::settings::{Settings, keys};
    use crate::tracking::TrackedList;
    use crate::{VmsyncContext, config::Config};
    use anyhow::Result;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// A set-up project whose external tools all succeed without doing anything
    pub struct TestProject {
        pub temp_dir: TempDir,
        pub root: PathBuf,
        pub context: VmsyncContext,
    }

    impl TestProject {
        pub fn new() -> Result<Self> {
            Self::with_tools(|_| {})
        }

        /// Like [`TestProject::new`], letting the caller swap tool programs
        pub fn with_tools<F>(configure: F) -> Result<Self>
        where
            F: FnOnce(&mut Config),
        {
            let temp_dir = tempfile::tempdir()?;
            let root = temp_dir.path().join("project");
            let config_path = temp_dir.path().join("config.toml");
            fs::create_dir_all(&root)?;

            let mut config = Config::default();
            config.tools.ssh = "true".to_string();
            config.tools.ssh_keygen = "true".to_string();
            config.tools.ssh_copy_id = "true".to_string();
            config.tools.rsync = "true".to_string();
            config.tools.ping = "true".to_string();
            configure(&mut config);
            config.save(&config_path)?;

            let context = VmsyncContext::new_explicit(root.clone(), config_path)?;
            context.ensure_settings_dir()?;

            let mut settings = Settings::empty(context.settings_path());
            settings.set(keys::REMOTE_HOST, "dev@testvm")?;
            settings.set(keys::REMOTE_PORT, "22")?;
            settings.set(keys::REMOTE_DIR, "sandbox")?;
            settings.set(keys::PROJECT_NAME, "project")?;
            settings.set(keys::SSH_KEY, "id_ed25519")?;
            settings.set(keys::KEY_COMMENT, "vmsync-project-20261019T120000")?;
            settings.set(keys::EXCLUDED_FILES, ".git *.swp")?;
            settings.save()?;

            fs::write(context.settings_dir().join("id_ed25519"), "private")?;
            fs::write(
                context.settings_dir().join("id_ed25519.pub"),
                "ssh-ed25519 AAAA vmsync-project-20261019T120000\n",
            )?;
            TrackedList::new().save(&context.tracked_path())?;

            Ok(Self {
                temp_dir,
                root,
                context,
            })
        }

        pub fn create_file(&self, name: &str, content: &str) -> Result<PathBuf> {
            let path = self.root.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
            Ok(path)
        }

        /// Absolute path of `name` as a command-line argument
        pub fn arg(&self, name: &str) -> String {
            self.root.join(name).to_string_lossy().into_owned()
        }

        pub fn settings(&self) -> Result<Settings> {
            Settings::load(&self.context.settings_path())
        }

        pub fn tracked(&self) -> Result<Vec<PathBuf>> {
            Ok(TrackedList::load(&self.context.tracked_path())?
                .entries()
                .to_vec())
        }

        pub fn write_tracked(&self, content: &str) -> Result<()> {
            fs::write(self.context.tracked_path(), content)?;
            Ok(())
        }

        pub fn path(&self) -> &Path {
            &self.root
        }
    }
}
