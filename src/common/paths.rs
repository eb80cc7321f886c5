use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Centralized path management for guhwall

const APP_DIR: &str = "guhwall";

/// Get the guhwall config directory (holds `config.json` and `settings.toml`)
///
/// Not created here; writers create it on demand.
pub fn guhwall_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join(APP_DIR))
}

/// Get the guhwall data directory, creating it if missing
pub fn guhwall_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| {
            let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));
            home.join(".local/share")
        })
        .join(APP_DIR);

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data directory at {}", data_dir.display()))?;

    Ok(data_dir)
}

pub fn last_folder_file() -> Result<PathBuf> {
    Ok(guhwall_config_dir()?.join("config.json"))
}

pub fn settings_file() -> Result<PathBuf> {
    Ok(guhwall_config_dir()?.join("settings.toml"))
}

pub fn apply_log_file() -> Result<PathBuf> {
    Ok(guhwall_data_dir()?.join("apply-errors.jsonl"))
}

pub fn input_rebind_script() -> Result<PathBuf> {
    Ok(guhwall_data_dir()?.join("input-rebind.sh"))
}

/// Shorten a path for display by replacing the home directory with `~`
pub fn tilde_display(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => tilde_display_with_home(path, &home),
        None => path.display().to_string(),
    }
}

fn tilde_display_with_home(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.display()),
        Err(_) => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tilde_replaces_home_prefix_only() {
        let home = Path::new("/home/guh");
        assert_eq!(
            tilde_display_with_home(Path::new("/home/guh/Pictures/walls"), home),
            "~/Pictures/walls"
        );
        assert_eq!(tilde_display_with_home(home, home), "~");
        assert_eq!(
            tilde_display_with_home(Path::new("/home/guhx/walls"), home),
            "/home/guhx/walls"
        );
        assert_eq!(
            tilde_display_with_home(Path::new("/usr/share/backgrounds"), home),
            "/usr/share/backgrounds"
        );
    }
}
