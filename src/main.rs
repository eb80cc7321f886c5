mod common;
mod completions;
mod gallery;
mod ui;
mod wallpaper;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use crate::completions::CompletionCommands;
use crate::gallery::GallerySession;
use crate::ui::prelude::*;
use crate::wallpaper::Settings;
use crate::wallpaper::cli::WallpaperCommands;

/// guhwall: pick a wallpaper from a folder and apply it
#[derive(Parser, Debug)]
#[command(name = "guhwall", author, version, about, long_about = None)]
struct Cli {
    /// Print debug events
    #[arg(short, long, global = true)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the last folder and apply wallpapers interactively (default)
    Gallery,

    #[command(flatten)]
    Wallpaper(WallpaperCommands),

    /// Shell completion scripts
    Completions {
        #[command(subcommand)]
        command: CompletionCommands,
    },
}

pub(crate) fn cli_command() -> clap::Command {
    Cli::command()
}

async fn run_gallery(settings: &Settings) -> Result<()> {
    let mut session = GallerySession::init(settings)?;
    let outcome = session.run().await;
    session.teardown().await;
    outcome
}

async fn dispatch(cli: Cli) -> Result<()> {
    let settings = Settings::load().context("loading settings")?;

    match cli.command {
        None | Some(Commands::Gallery) => run_gallery(&settings).await,
        Some(Commands::Wallpaper(command)) => {
            wallpaper::commands::handle_wallpaper_command(command, &settings).await
        }
        Some(Commands::Completions { command }) => match command {
            CompletionCommands::Generate { shell } => {
                print!("{}", completions::generate(shell)?);
                Ok(())
            }
            CompletionCommands::Install { shell, force } => {
                let path = completions::install(shell, force)?;
                emit(
                    Level::Success,
                    "completions.installed",
                    &format!("Installed {shell} completions to {}", path.display()),
                    None,
                );
                Ok(())
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    ui::init(cli.output, !cli.no_color);
    ui::set_debug_mode(cli.debug);

    if let Err(e) = dispatch(cli).await {
        emit(Level::Error, "guhwall.error", &format!("Error: {e:#}"), None);
        std::process::exit(1);
    }
}
