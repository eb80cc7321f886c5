use anyhow::{Context, Result};
use colored::*;
use std::path::PathBuf;

use crate::common::paths::{self, tilde_display};
use crate::common::progress::{create_spinner, finish_spinner};
use crate::gallery::{FolderPick, FolderPicker};
use crate::ui::prelude::*;
use crate::wallpaper::cli::{
    ApplyArgs, FolderArgs, ListArgs, LogArgs, RandomArgs, WallpaperCommands,
};
use crate::wallpaper::config::ConfigStore;
use crate::wallpaper::images::{IMAGE_EXTENSIONS, list_entries, random_image};
use crate::wallpaper::log::ApplyLog;
use crate::wallpaper::settings::Settings;
use crate::wallpaper::url::{display_url, path_from_display_url};
use crate::wallpaper::{WallpaperApplier, doctor};

pub async fn handle_wallpaper_command(
    command: WallpaperCommands,
    settings: &Settings,
) -> Result<()> {
    match command {
        WallpaperCommands::List(args) => handle_list(args, settings),
        WallpaperCommands::Apply(args) => handle_apply(args, settings).await,
        WallpaperCommands::Random(args) => handle_random(args, settings).await,
        WallpaperCommands::Folder(args) => handle_folder(args, settings).await,
        WallpaperCommands::Config => handle_config(settings),
        WallpaperCommands::Log(args) => handle_log(args),
        WallpaperCommands::Doctor => {
            doctor::print_results(&doctor::run_checks(&doctor::checks_for(settings)));
            Ok(())
        }
    }
}

/// The given folder made absolute, or the last used folder.
fn folder_or_last(dir: Option<PathBuf>, settings: &Settings) -> Result<PathBuf> {
    match dir {
        Some(dir) => {
            std::path::absolute(&dir).with_context(|| format!("resolving {}", dir.display()))
        }
        None => Ok(ConfigStore::open(settings.default_dir())?.load()),
    }
}

fn handle_list(args: ListArgs, settings: &Settings) -> Result<()> {
    let dir = folder_or_last(args.dir, settings)?;

    let entries = list_entries(&dir);
    if entries.is_empty() {
        emit(
            Level::Info,
            "wallpaper.list.empty",
            &format!("No images found in {}", tilde_display(&dir)),
            Some(serde_json::json!({ "dir": dir })),
        );
        return Ok(());
    }

    for entry in &entries {
        let url = display_url(&entry.path);
        emit(
            Level::Info,
            "wallpaper.list.entry",
            &entry.path.display().to_string(),
            Some(serde_json::json!({
                "path": entry.path,
                "kind": entry.kind,
                "url": url,
            })),
        );
    }
    Ok(())
}

async fn handle_apply(args: ApplyArgs, settings: &Settings) -> Result<()> {
    // Accept the file:// URLs printed by `list` as well as plain paths
    let path = args
        .path
        .to_str()
        .and_then(path_from_display_url)
        .unwrap_or_else(|| args.path.clone());
    let image = std::path::absolute(&path)
        .with_context(|| format!("resolving {}", path.display()))?;
    apply_image(image, settings).await
}

async fn handle_random(args: RandomArgs, settings: &Settings) -> Result<()> {
    let dir = folder_or_last(args.dir, settings)?;

    let Some(image) = random_image(&dir) else {
        anyhow::bail!("no images found in {}", tilde_display(&dir));
    };
    emit(
        Level::Info,
        "wallpaper.random.picked",
        &format!("Picked {}", tilde_display(&image)),
        Some(serde_json::json!({ "path": image })),
    );
    apply_image(image, settings).await
}

async fn apply_image(image: PathBuf, settings: &Settings) -> Result<()> {
    let applier = WallpaperApplier::from_settings(settings);

    let spinner = (get_output_format() == OutputFormat::Text)
        .then(|| create_spinner(format!("Applying {}", tilde_display(&image))));
    let report = applier.apply(&image).await;
    if let Some(spinner) = spinner {
        finish_spinner(spinner);
    }

    for stage in &report.stages {
        let (level, message) = match stage.diagnostic() {
            None => (Level::Info, format!("{} {}", "✓".green(), stage.stage)),
            Some(diagnostic) => (
                Level::Warn,
                format!("{} {}: {}", "✗".yellow(), stage.stage, diagnostic),
            ),
        };
        emit(level, "wallpaper.apply.stage", &message, None);
    }

    emit(
        Level::Success,
        "wallpaper.apply.done",
        &format!("Wallpaper applied: {}", image.display()),
        Some(report.to_json()),
    );
    Ok(())
}

async fn handle_folder(args: FolderArgs, settings: &Settings) -> Result<()> {
    let store = ConfigStore::open(settings.default_dir())?;

    let dir = match args.dir {
        Some(dir) => {
            let dir = std::path::absolute(&dir)
                .with_context(|| format!("resolving {}", dir.display()))?;
            if !dir.is_dir() {
                anyhow::bail!("{} is not a folder", dir.display());
            }
            dir
        }
        None => {
            let picker = FolderPicker::new(store.load());
            match tokio::task::spawn_blocking(move || picker.pick()).await?? {
                FolderPick::Selected(dir) => dir,
                FolderPick::Cancelled => {
                    emit(Level::Info, "wallpaper.folder.cancelled", "No folder selected", None);
                    return Ok(());
                }
            }
        }
    };

    store.save(&dir);
    emit(
        Level::Success,
        "wallpaper.folder.saved",
        &format!("Gallery folder set to {}", tilde_display(&dir).green()),
        Some(serde_json::json!({ "lastPath": dir })),
    );
    Ok(())
}

fn handle_config(settings: &Settings) -> Result<()> {
    let store = ConfigStore::open(settings.default_dir())?;
    let settings_file = paths::settings_file()?;
    let log = ApplyLog::open_default()?;
    let log_file = log.path();
    let folder = store.load();

    let rows = [
        ("Config file", store.file().display().to_string()),
        ("Settings file", settings_file.display().to_string()),
        ("Error log", log_file.display().to_string()),
        ("Gallery folder", folder.display().to_string()),
        ("Default folder", store.default_dir().display().to_string()),
        ("Setter", format!("{} -i <image>", settings.setter)),
        ("Scaler", format!("{} --bg-scale <image>", settings.scaler)),
        ("Rebind interpreter", settings.interpreter.clone()),
        ("Stage timeout", format!("{}s", settings.stage_timeout().as_secs())),
        ("Notifications", settings.notifications.to_string()),
        (
            "Theme hook",
            settings
                .theme_hook
                .map_or_else(|| "none".to_string(), |hook| hook.program().to_string()),
        ),
        ("Image types", IMAGE_EXTENSIONS.join(", ")),
    ];

    let text = rows
        .iter()
        .map(|(label, value)| format!("{:<20} {}", format!("{label}:").bold(), value))
        .collect::<Vec<_>>()
        .join("\n");

    emit(
        Level::Info,
        "wallpaper.config.show",
        &text,
        Some(serde_json::json!({
            "config_file": store.file(),
            "settings_file": settings_file,
            "log_file": log_file,
            "last_folder": folder,
            "settings": settings,
        })),
    );
    Ok(())
}

fn handle_log(args: LogArgs) -> Result<()> {
    let log = ApplyLog::open_default()?;

    if args.clear {
        log.clear()?;
        emit(Level::Success, "wallpaper.log.cleared", "Error log cleared", None);
        return Ok(());
    }

    let entries = log.entries()?;
    if entries.is_empty() {
        emit(
            Level::Info,
            "wallpaper.log.empty",
            "No pipeline failures recorded",
            None,
        );
        return Ok(());
    }

    for entry in entries.iter().take(args.limit) {
        let when = entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC");
        emit(
            Level::Info,
            "wallpaper.log.entry",
            &format!(
                "{} {} {}\n  {}",
                when.to_string().dimmed(),
                entry.stage.yellow(),
                entry.image,
                entry.diagnostic
            ),
            Some(serde_json::to_value(entry)?),
        );
        separator();
    }
    Ok(())
}
