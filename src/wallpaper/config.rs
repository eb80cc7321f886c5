use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::common::paths;
use crate::ui::prelude::*;

/// On-disk shape of `config.json`. Unknown keys are ignored.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
struct LastFolderFile {
    #[serde(rename = "lastPath", default, skip_serializing_if = "Option::is_none")]
    last_path: Option<String>,
}

/// Persists the last folder the user browsed.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    file: PathBuf,
    default_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(file: impl Into<PathBuf>, default_dir: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            default_dir: default_dir.into(),
        }
    }

    /// Store at the per-user location.
    pub fn open(default_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self::new(paths::last_folder_file()?, default_dir))
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn default_dir(&self) -> &Path {
        &self.default_dir
    }

    /// Last folder if it is still a directory, the default folder otherwise.
    pub fn load(&self) -> PathBuf {
        match self.read_last_folder() {
            Ok(Some(dir)) if dir.is_dir() => return dir,
            Ok(Some(dir)) => emit(
                Level::Debug,
                "config.last_folder.missing",
                &format!("Stored folder {} no longer exists", dir.display()),
                None,
            ),
            Ok(None) => {}
            Err(e) => emit(
                Level::Debug,
                "config.read.failed",
                &format!("Ignoring unreadable {}: {e:#}", self.file.display()),
                None,
            ),
        }
        self.default_dir.clone()
    }

    /// Remember `dir` as the last folder. Failures are reported, not returned.
    pub fn save(&self, dir: &Path) {
        if let Err(e) = self.write_last_folder(dir) {
            emit(
                Level::Warn,
                "config.write.failed",
                &format!("Could not save last folder: {e:#}"),
                None,
            );
        }
    }

    fn read_last_folder(&self) -> Result<Option<PathBuf>> {
        if !self.file.exists() {
            return Ok(None);
        }

        let s = fs::read_to_string(&self.file)
            .with_context(|| format!("reading config {}", self.file.display()))?;
        let parsed: LastFolderFile = serde_json::from_str(&s).context("parsing config json")?;
        Ok(parsed
            .last_path
            .filter(|p| !p.is_empty())
            .map(PathBuf::from))
    }

    fn write_last_folder(&self, dir: &Path) -> Result<()> {
        if let Some(parent) = self.file.parent() {
            fs::create_dir_all(parent).context("creating config directory")?;
        }

        let contents = serde_json::to_string(&LastFolderFile {
            last_path: Some(dir.to_string_lossy().into_owned()),
        })
        .context("serializing config to json")?;
        fs::write(&self.file, contents).context("writing config file")?;
        Ok(())
    }
}
