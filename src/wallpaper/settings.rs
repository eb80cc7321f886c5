use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::paths;

pub const DEFAULT_WALLPAPER_DIR: &str = "/usr/share/backgrounds/guhwm_wallpapers";

/// Color scheme generator run after the wallpaper is applied.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeHook {
    /// `wal -i <image> -n`
    Pywal,
    /// `matugen image <image>`
    Matugen,
}

impl ThemeHook {
    pub fn program(self) -> &'static str {
        match self {
            ThemeHook::Pywal => "wal",
            ThemeHook::Matugen => "matugen",
        }
    }
}

/// Tool and behavior settings, read from `settings.toml`.
///
/// Every field has a default, so an empty or partial file is valid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Folder shown when no valid last folder is stored
    pub default_dir: String,
    /// Wallpaper setter, invoked as `<setter> -i <image>`
    pub setter: String,
    /// Scale forcer, invoked as `<scaler> --bg-scale <image>`
    pub scaler: String,
    /// Interpreter for the input rebind script
    pub interpreter: String,
    /// Upper bound for each pipeline stage
    pub stage_timeout_secs: u64,
    /// Show desktop notifications for gallery status messages
    pub notifications: bool,
    /// Optional theme generator, run after the input rebind
    pub theme_hook: Option<ThemeHook>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_dir: DEFAULT_WALLPAPER_DIR.to_string(),
            setter: "walrs".to_string(),
            scaler: "feh".to_string(),
            interpreter: "/bin/bash".to_string(),
            stage_timeout_secs: 30,
            notifications: true,
            theme_hook: None,
        }
    }
}

impl Settings {
    pub fn config_file_path() -> Result<PathBuf> {
        paths::settings_file()
    }

    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path()?)
    }

    pub fn load_from_path(cfg_path: &Path) -> Result<Self> {
        if !cfg_path.exists() {
            return Ok(Self::default());
        }

        let s = fs::read_to_string(cfg_path)
            .with_context(|| format!("reading settings {}", cfg_path.display()))?;
        toml::from_str(&s).with_context(|| format!("parsing settings {}", cfg_path.display()))
    }

    /// Default folder with `~` and environment variables expanded
    pub fn default_dir(&self) -> PathBuf {
        match shellexpand::full(&self.default_dir) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(&self.default_dir),
        }
    }

    pub fn stage_timeout(&self) -> Duration {
        Duration::from_secs(self.stage_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load_from_path(&temp_dir.path().join("settings.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.default_dir(), PathBuf::from(DEFAULT_WALLPAPER_DIR));
        assert_eq!(settings.stage_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "setter = \"swww-img\"\nstage_timeout_secs = 5\n").unwrap();

        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.setter, "swww-img");
        assert_eq!(settings.stage_timeout(), Duration::from_secs(5));
        assert_eq!(settings.scaler, "feh");
        assert_eq!(settings.interpreter, "/bin/bash");
        assert!(settings.notifications);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");
        fs::write(&path, "setter = [not toml").unwrap();
        assert!(Settings::load_from_path(&path).is_err());
    }

    #[test]
    fn theme_hook_is_off_unless_named() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.toml");

        fs::write(&path, "setter = \"walrs\"\n").unwrap();
        assert_eq!(Settings::load_from_path(&path).unwrap().theme_hook, None);

        fs::write(&path, "theme_hook = \"matugen\"\n").unwrap();
        let settings = Settings::load_from_path(&path).unwrap();
        assert_eq!(settings.theme_hook, Some(ThemeHook::Matugen));
        assert_eq!(ThemeHook::Pywal.program(), "wal");

        fs::write(&path, "theme_hook = \"kde\"\n").unwrap();
        assert!(Settings::load_from_path(&path).is_err());
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let settings = Settings {
            stage_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(settings.stage_timeout(), Duration::from_secs(1));
    }
}
