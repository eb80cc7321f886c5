//! Folder selection: native dialog first, fzf prompt as a fallback.

use anyhow::Result;
use duct::cmd;
use std::path::{Path, PathBuf};
use which::which;

use super::fzf::FzfWrapper;
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderPick {
    Selected(PathBuf),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogBackend {
    Zenity,
    Kdialog,
    FzfPrompt,
}

impl DialogBackend {
    /// First usable backend in preference order
    pub fn detect() -> Self {
        if which("zenity").is_ok() {
            DialogBackend::Zenity
        } else if which("kdialog").is_ok() {
            DialogBackend::Kdialog
        } else {
            DialogBackend::FzfPrompt
        }
    }
}

pub struct FolderPicker {
    start_dir: PathBuf,
    backend: DialogBackend,
}

impl FolderPicker {
    pub fn new(start_dir: impl Into<PathBuf>) -> Self {
        Self {
            start_dir: start_dir.into(),
            backend: DialogBackend::detect(),
        }
    }

    pub fn pick(&self) -> Result<FolderPick> {
        let raw = match self.backend {
            DialogBackend::Zenity => self.run_zenity()?,
            DialogBackend::Kdialog => self.run_kdialog()?,
            DialogBackend::FzfPrompt => {
                FzfWrapper::input("Folder:", &self.start_dir.to_string_lossy())?
            }
        };

        let Some(raw) = raw else {
            return Ok(FolderPick::Cancelled);
        };

        match resolve_folder(&raw) {
            Some(dir) => Ok(FolderPick::Selected(dir)),
            None => {
                emit(
                    Level::Warn,
                    "gallery.folder.invalid",
                    &format!("{raw} is not a folder"),
                    None,
                );
                Ok(FolderPick::Cancelled)
            }
        }
    }

    fn run_zenity(&self) -> Result<Option<String>> {
        // Trailing slash makes zenity open inside the folder
        let start = format!("{}/", self.start_dir.display());
        let output = cmd!(
            "zenity",
            "--file-selection",
            "--directory",
            "--title=Select wallpaper folder",
            format!("--filename={start}")
        )
        .stdout_capture()
        .stderr_null()
        .unchecked()
        .run()?;
        Ok(dialog_answer(output.status.success(), &output.stdout))
    }

    fn run_kdialog(&self) -> Result<Option<String>> {
        let output = cmd!(
            "kdialog",
            "--title",
            "Select wallpaper folder",
            "--getexistingdirectory",
            &self.start_dir
        )
        .stdout_capture()
        .stderr_null()
        .unchecked()
        .run()?;
        Ok(dialog_answer(output.status.success(), &output.stdout))
    }
}

fn dialog_answer(success: bool, stdout: &[u8]) -> Option<String> {
    if !success {
        return None;
    }
    let answer = String::from_utf8_lossy(stdout).trim().to_string();
    (!answer.is_empty()).then_some(answer)
}

/// Expand `~`/variables and accept only existing directories, made absolute.
pub fn resolve_folder(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    let expanded = shellexpand::full(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let path = Path::new(&expanded);
    if !path.is_dir() {
        return None;
    }
    std::path::absolute(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn dialog_cancel_and_empty_answers_are_none() {
        assert_eq!(dialog_answer(false, b"/home/guh/walls\n"), None);
        assert_eq!(dialog_answer(true, b"\n"), None);
        assert_eq!(
            dialog_answer(true, b"/home/guh/my walls\n"),
            Some("/home/guh/my walls".to_string())
        );
    }

    #[test]
    fn resolve_folder_requires_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("wall.png");
        std::fs::write(&file, b"").unwrap();

        assert_eq!(
            resolve_folder(&format!("  {}  ", temp_dir.path().display())),
            Some(temp_dir.path().to_path_buf())
        );
        assert_eq!(resolve_folder(&file.to_string_lossy()), None);
        assert_eq!(resolve_folder("/nonexistent/guhwall/walls"), None);
    }
}
