use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated XDG directories plus a scratch area for wallpaper folders.
pub struct TestEnvironment {
    temp_dir: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        for sub in ["config", "data", "walls"] {
            fs::create_dir_all(temp_dir.path().join(sub))?;
        }
        Ok(Self { temp_dir })
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config_home(&self) -> PathBuf {
        self.path().join("config")
    }

    pub fn data_home(&self) -> PathBuf {
        self.path().join("data")
    }

    pub fn walls(&self) -> PathBuf {
        self.path().join("walls")
    }

    pub fn last_folder_file(&self) -> PathBuf {
        self.config_home().join("guhwall").join("config.json")
    }

    pub fn apply_log_file(&self) -> PathBuf {
        self.data_home().join("guhwall").join("apply-errors.jsonl")
    }

    /// Write `settings.toml`; the default folder always points into the sandbox.
    pub fn write_settings(&self, extra: &str) -> Result<()> {
        let dir = self.config_home().join("guhwall");
        fs::create_dir_all(&dir)?;
        let body = format!(
            "default_dir = \"{}\"\nnotifications = false\n{extra}",
            self.walls().display()
        );
        fs::write(dir.join("settings.toml"), body)?;
        Ok(())
    }

    pub fn touch(&self, relative: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, b"")?;
        Ok(path)
    }
}
