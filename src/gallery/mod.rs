//! Interactive gallery: pick a folder, pick an image, apply it.

mod folder;
mod fzf;
mod status;

pub use folder::{FolderPick, FolderPicker};
use status::{StatusKind, StatusToast};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

use crate::common::paths::tilde_display;
use crate::common::shell::shell_quote;
use crate::ui::prelude::*;
use crate::wallpaper::images::{ImageEntry, list_entries, random_image};
use crate::wallpaper::url::display_url;
use crate::wallpaper::{ConfigStore, Settings, WallpaperApplier};
use fzf::{FzfOptions, FzfPreview, FzfResult, FzfSelectable, FzfWrapper};

const CHANGE_FOLDER: &str = "» Change folder…";
const RANDOM: &str = "» Random wallpaper";
const EMPTY_FOLDER: &str = "No images found in this folder.";

#[derive(Debug, Clone)]
enum GalleryItem {
    ChangeFolder,
    Random,
    Image(ImageEntry),
}

impl FzfSelectable for GalleryItem {
    fn fzf_display_text(&self) -> String {
        match self {
            GalleryItem::ChangeFolder => CHANGE_FOLDER.to_string(),
            GalleryItem::Random => RANDOM.to_string(),
            GalleryItem::Image(entry) => entry.file_name(),
        }
    }

    fn fzf_preview(&self) -> FzfPreview {
        match self {
            GalleryItem::ChangeFolder => {
                FzfPreview::Text("Pick another wallpaper folder".to_string())
            }
            GalleryItem::Random => {
                FzfPreview::Text("Apply a random image from this folder".to_string())
            }
            GalleryItem::Image(entry) => FzfPreview::Command(image_preview_command(&entry.path)),
        }
    }
}

/// Render with chafa when present, otherwise show the file URL.
fn image_preview_command(path: &Path) -> String {
    let quoted_path = shell_quote(&path.to_string_lossy());
    let quoted_url = shell_quote(&display_url(path));
    format!(
        "if command -v chafa >/dev/null 2>&1; then \
         chafa --size=\"${{FZF_PREVIEW_COLUMNS}}x${{FZF_PREVIEW_LINES}}\" {quoted_path}; \
         else printf '%s\\n' {quoted_url}; fi"
    )
}

fn gallery_items(entries: Vec<ImageEntry>) -> Vec<GalleryItem> {
    let random = (!entries.is_empty()).then_some(GalleryItem::Random);
    std::iter::once(GalleryItem::ChangeFolder)
        .chain(random)
        .chain(entries.into_iter().map(GalleryItem::Image))
        .collect()
}

fn gallery_header(dir: &Path, image_count: usize) -> String {
    if image_count == 0 {
        format!("{}\n{EMPTY_FOLDER}", tilde_display(dir))
    } else {
        format!("{}  ({image_count} images)", tilde_display(dir))
    }
}

/// One gallery run, from `init` to `teardown`.
///
/// Applications run as background tasks; the applier serializes them.
pub struct GallerySession {
    store: ConfigStore,
    applier: WallpaperApplier,
    toast: StatusToast,
    current_dir: PathBuf,
    in_flight: JoinSet<(PathBuf, usize)>,
}

impl GallerySession {
    pub fn init(settings: &Settings) -> Result<Self> {
        let store = ConfigStore::open(settings.default_dir())?;
        let current_dir = store.load();
        Ok(Self {
            store,
            applier: WallpaperApplier::from_settings(settings),
            toast: StatusToast::new(settings.notifications),
            current_dir,
            in_flight: JoinSet::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.reap_finished();

            let entries = list_entries(&self.current_dir);
            let header = gallery_header(&self.current_dir, entries.len());
            let items = gallery_items(entries);

            let selection = tokio::task::spawn_blocking(move || {
                FzfWrapper::with_options(FzfOptions {
                    prompt: Some("Wallpaper".to_string()),
                    header: Some(header),
                    ..Default::default()
                })
                .select(items)
            })
            .await
            .context("gallery menu task failed")??;

            match selection {
                FzfResult::Selected(GalleryItem::Image(entry)) => self.start_apply(entry.path),
                FzfResult::Selected(GalleryItem::Random) => {
                    if let Some(image) = random_image(&self.current_dir) {
                        self.start_apply(image);
                    }
                }
                FzfResult::Selected(GalleryItem::ChangeFolder) => self.change_folder().await?,
                FzfResult::Cancelled => return Ok(()),
            }
        }
    }

    async fn change_folder(&mut self) -> Result<()> {
        let picker = FolderPicker::new(self.current_dir.clone());
        let pick = tokio::task::spawn_blocking(move || picker.pick())
            .await
            .context("folder picker task failed")??;

        if let FolderPick::Selected(dir) = pick {
            self.store.save(&dir);
            self.current_dir = dir;
        }
        Ok(())
    }

    fn start_apply(&mut self, image: PathBuf) {
        let applier = self.applier.clone();
        let toast = self.toast.clone();
        toast.show(StatusKind::Progress, status::APPLYING);

        self.in_flight.spawn(async move {
            let report = applier.apply(&image).await;
            toast.notify(StatusKind::Success, status::APPLIED);
            (image, report.failures().count())
        });
    }

    /// Report finished applications once the menu has released the terminal.
    fn reap_finished(&mut self) {
        while let Some(joined) = self.in_flight.try_join_next() {
            self.report_joined(joined);
        }
    }

    fn report_joined(&self, joined: Result<(PathBuf, usize), tokio::task::JoinError>) {
        match joined {
            Ok((image, failed)) => {
                self.toast.print(
                    StatusKind::Success,
                    &format!("{} {}", status::APPLIED, image.display()),
                );
                if failed > 0 {
                    emit(
                        Level::Debug,
                        "gallery.apply.partial",
                        &format!("{failed} stage(s) failed, see `guhwall log`"),
                        None,
                    );
                }
            }
            Err(e) => {
                self.toast.show(StatusKind::Error, status::FAILED);
                emit(
                    Level::Debug,
                    "gallery.apply.task_failed",
                    &format!("{e}"),
                    None,
                );
            }
        }
    }

    /// Wait for queued applications, then release the session.
    pub async fn teardown(mut self) {
        if !self.in_flight.is_empty() {
            emit(
                Level::Info,
                "gallery.teardown.waiting",
                "Waiting for pending wallpaper changes…",
                None,
            );
        }
        while let Some(joined) = self.in_flight.join_next().await {
            self.report_joined(joined);
        }
    }
}
