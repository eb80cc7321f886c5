use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug, Clone)]
pub enum WallpaperCommands {
    /// List the images of a folder
    List(ListArgs),
    /// Apply an image as the wallpaper
    Apply(ApplyArgs),
    /// Apply a random image from a folder
    Random(RandomArgs),
    /// Remember a folder as the gallery folder
    Folder(FolderArgs),
    /// Show file locations and effective settings
    Config,
    /// Show or clear recent pipeline failures
    Log(LogArgs),
    /// Check that the external tools are available
    Doctor,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Folder to list (defaults to the last used folder)
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    /// Path to the wallpaper image
    pub path: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct RandomArgs {
    /// Folder to pick from (defaults to the last used folder)
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct FolderArgs {
    /// Folder to remember; opens the folder picker when omitted
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Number of entries to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
    /// Delete the log instead of showing it
    #[arg(long)]
    pub clear: bool,
}
