use std::{fmt, fs, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use clap_complete::Shell;

use crate::common::paths;

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SupportedShell {
    Bash,
    Zsh,
}

impl SupportedShell {
    fn as_complete_shell(self) -> Shell {
        match self {
            SupportedShell::Bash => Shell::Bash,
            SupportedShell::Zsh => Shell::Zsh,
        }
    }

    fn file_name(self) -> &'static str {
        match self {
            SupportedShell::Bash => "guhwall.bash",
            SupportedShell::Zsh => "_guhwall",
        }
    }
}

impl fmt::Display for SupportedShell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportedShell::Bash => write!(f, "bash"),
            SupportedShell::Zsh => write!(f, "zsh"),
        }
    }
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum CompletionCommands {
    /// Print the completion script
    Generate {
        #[arg(value_enum)]
        shell: SupportedShell,
    },
    /// Write the completion script into the data directory
    Install {
        #[arg(value_enum)]
        shell: SupportedShell,
        #[arg(long)]
        force: bool,
    },
}

pub fn generate(shell: SupportedShell) -> Result<String> {
    let mut command = crate::cli_command();
    let mut buffer = Vec::new();
    clap_complete::generate(
        shell.as_complete_shell(),
        &mut command,
        "guhwall",
        &mut buffer,
    );
    String::from_utf8(buffer).context("rendering completions")
}

pub fn install(shell: SupportedShell, force: bool) -> Result<PathBuf> {
    let target_path = paths::guhwall_data_dir()?
        .join("completions")
        .join(shell.file_name());

    if target_path.exists() && !force {
        return Err(anyhow!(
            "{} already exists, pass --force to overwrite",
            target_path.display()
        ));
    }

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating completions directory {}", parent.display()))?;
    }
    fs::write(&target_path, generate(shell)?)
        .with_context(|| format!("writing completion script to {}", target_path.display()))?;

    Ok(target_path)
}
