//! Image discovery for a wallpaper folder.
//!
//! Listings are recomputed on every call; nothing is cached or watched.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::ui::prelude::*;

/// Extensions accepted as wallpapers, compared case-insensitively.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Bmp,
}

impl ImageKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(ImageKind::Jpeg),
            "png" => Some(ImageKind::Png),
            "webp" => Some(ImageKind::Webp),
            "bmp" => Some(ImageKind::Bmp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub kind: ImageKind,
}

impl ImageEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Image files directly inside `dir`, sorted by file name.
///
/// Paths are absolute and dotfiles are skipped. A missing or unreadable
/// folder yields an empty list.
pub fn list_entries(dir: &Path) -> Vec<ImageEntry> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let Ok(dir) = std::path::absolute(dir) else {
        return Vec::new();
    };

    let mut entries: Vec<ImageEntry> = WalkDir::new(&dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                emit(
                    Level::Debug,
                    "images.entry.skipped",
                    &format!("Skipping unreadable entry in {}: {e}", dir.display()),
                    None,
                );
                None
            }
        })
        .filter(|entry| !entry.file_type().is_dir())
        .filter_map(|entry| {
            let path = entry.into_path();
            ImageKind::from_path(&path).map(|kind| ImageEntry { path, kind })
        })
        .collect();

    // sort_by_file_name only orders siblings during the walk; keep the contract explicit
    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    entries
}

/// Paths of the images directly inside `dir`.
pub fn list_images(dir: &Path) -> Vec<PathBuf> {
    list_entries(dir).into_iter().map(|e| e.path).collect()
}

/// One image of `dir` picked uniformly at random.
pub fn random_image(dir: &Path) -> Option<PathBuf> {
    list_images(dir).choose(&mut rand::thread_rng()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    #[test]
    fn keeps_supported_extensions_in_any_case() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        let supported = [
            "a.jpg", "b.JPG", "c.jpeg", "d.JpEg", "e.png", "f.PNG", "g.webp", "h.WebP", "i.bmp",
            "j.BMP",
        ];
        let unsupported = [
            "k.gif", "l.txt", "m.png.bak", "README", "n.tiff", ".hidden", ".thumb.png",
        ];
        for name in supported.iter().chain(unsupported.iter()) {
            touch(dir, name);
        }

        let images = list_images(dir);

        assert_eq!(images.len(), supported.len());
        for name in unsupported {
            assert!(!images.contains(&dir.join(name)), "{name} should be filtered");
        }
        for name in supported {
            assert!(images.contains(&dir.join(name)), "{name} should be listed");
        }
    }

    #[test]
    fn missing_folder_is_empty_not_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(list_images(&temp_dir.path().join("does-not-exist")).is_empty());
    }

    #[test]
    fn file_instead_of_folder_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let file = touch(temp_dir.path(), "wall.png");
        assert!(list_images(&file).is_empty());
    }

    #[test]
    fn listing_is_flat_sorted_and_full_paths() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "zeta.png");
        touch(dir, "alpha.jpg");
        touch(dir, "mid.webp");
        fs::create_dir(dir.join("nested")).unwrap();
        touch(&dir.join("nested"), "deep.png");
        fs::create_dir(dir.join("folder.png")).unwrap();

        let images = list_images(dir);
        assert_eq!(
            images,
            vec![dir.join("alpha.jpg"), dir.join("mid.webp"), dir.join("zeta.png")]
        );
    }

    #[test]
    fn entries_carry_kind() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "photo.JPEG");
        touch(temp_dir.path(), "shot.bmp");

        let entries = list_entries(temp_dir.path());
        let kinds: Vec<_> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ImageKind::Jpeg, ImageKind::Bmp]);
        assert_eq!(entries[0].file_name(), "photo.JPEG");
    }

    #[test]
    fn hidden_folder_itself_is_still_listed() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".wallpapers");
        fs::create_dir(&dir).unwrap();
        touch(&dir, "a.png");
        touch(&dir, ".cache.png");

        assert_eq!(list_images(&dir), vec![dir.join("a.png")]);
    }

    #[test]
    fn random_image_comes_from_the_listing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        touch(dir, "a.png");
        touch(dir, "b.jpg");
        touch(dir, "notes.txt");

        for _ in 0..20 {
            let picked = random_image(dir).unwrap();
            assert!(picked == dir.join("a.png") || picked == dir.join("b.jpg"));
        }
        assert_eq!(random_image(&dir.join("missing")), None);
    }
}
