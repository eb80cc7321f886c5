//! Minimal fzf wrapper for the gallery.
//!
//! Each line carries its item index, so selections map back by position and
//! previews come from a generated script keyed on that index.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use tempfile::{NamedTempFile, TempPath};

use crate::common::shell::shell_quote;

/// Preview type for fzf items
#[derive(Debug, Clone)]
pub enum FzfPreview {
    Text(String),
    /// Shell command run by the preview script
    Command(String),
    None,
}

/// Core trait that types must implement to be selectable with fzf
pub trait FzfSelectable {
    /// The text that appears in the fzf selection list
    fn fzf_display_text(&self) -> String;

    fn fzf_preview(&self) -> FzfPreview {
        FzfPreview::None
    }
}

#[derive(Debug, Clone)]
pub struct FzfOptions {
    pub prompt: Option<String>,
    pub header: Option<String>,
    pub additional_args: Vec<String>,
}

impl Default for FzfOptions {
    fn default() -> Self {
        Self {
            prompt: None,
            header: None,
            additional_args: Self::default_margin_args(),
        }
    }
}

impl FzfOptions {
    fn default_margin_args() -> Vec<String> {
        vec![
            "--margin".to_string(),
            "5%,2%".to_string(),
            "--min-height".to_string(),
            "10".to_string(),
            "--preview-window".to_string(),
            "right,60%".to_string(),
        ]
    }

    fn input_margin_args() -> Vec<String> {
        vec![
            "--margin".to_string(),
            "20%,2%".to_string(),
            "--min-height".to_string(),
            "10".to_string(),
        ]
    }
}

#[derive(Debug)]
pub enum FzfResult<T> {
    Selected(T),
    Cancelled,
}

pub struct FzfWrapper {
    options: FzfOptions,
}

pub struct PreviewUtils;

impl PreviewUtils {
    /// Write a bash script that prints the preview for the key given as `$1`
    pub fn create_preview_script(preview_map: &HashMap<String, FzfPreview>) -> Result<TempPath> {
        let mut temp_file = NamedTempFile::new().context("creating preview script")?;

        let mut arms: Vec<String> = preview_map
            .iter()
            .filter_map(|(key, preview)| {
                let key = shell_quote(key);
                match preview {
                    FzfPreview::Text(text) => {
                        Some(format!("{key}) printf '%s\\n' {} ;;", shell_quote(text)))
                    }
                    FzfPreview::Command(cmd) => Some(format!("{key}) {cmd} ;;")),
                    FzfPreview::None => None,
                }
            })
            .collect();
        arms.sort();

        let script_content = format!(
            "#!/bin/bash\ncase \"$1\" in\n{}\n*)\n    echo \"No preview available\"\n    ;;\nesac\n",
            arms.join("\n")
        );

        temp_file.write_all(script_content.as_bytes())?;
        temp_file.flush()?;

        let temp_path = temp_file.into_temp_path();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&temp_path)?.permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&temp_path, perms)?;
        }

        Ok(temp_path)
    }

    /// Previews keyed by item index
    pub fn build_preview_map<T: FzfSelectable>(items: &[T]) -> HashMap<String, FzfPreview> {
        items
            .iter()
            .enumerate()
            .filter_map(|(index, item)| match item.fzf_preview() {
                FzfPreview::None => None,
                preview => Some((index.to_string(), preview)),
            })
            .collect()
    }
}

impl FzfWrapper {
    pub fn with_options(options: FzfOptions) -> Self {
        Self { options }
    }

    pub fn select<T: FzfSelectable>(&self, items: Vec<T>) -> Result<FzfResult<T>> {
        if items.is_empty() {
            return Ok(FzfResult::Cancelled);
        }

        let preview_map = PreviewUtils::build_preview_map(&items);
        // Kept alive until fzf exits
        let preview_script: Option<TempPath> = if preview_map.is_empty() {
            None
        } else {
            Some(PreviewUtils::create_preview_script(&preview_map)?)
        };

        // Lines are `<index>\t<text>`; only the text is shown and searched
        let mut cmd = Command::new("fzf");
        cmd.env_remove("FZF_DEFAULT_OPTS")
            .arg("--no-sort")
            .arg("--layout=reverse")
            .arg("--delimiter=\t")
            .arg("--with-nth=2..");

        if let Some(prompt) = &self.options.prompt {
            cmd.arg("--prompt").arg(format!("{prompt} > "));
        }
        if let Some(header) = &self.options.header {
            cmd.arg("--header").arg(header);
        }
        if let Some(script) = &preview_script {
            let script: PathBuf = script.to_path_buf();
            cmd.arg("--preview")
                .arg(format!("{} {{1}}", shell_quote(&script.to_string_lossy())));
        }
        cmd.args(&self.options.additional_args);

        let selected = run_with_input(cmd, &indexed_lines(&items))?;
        drop(preview_script);

        let index = selected.as_deref().and_then(selected_index);
        Ok(match index.and_then(|i| items.into_iter().nth(i)) {
            Some(item) => FzfResult::Selected(item),
            None => FzfResult::Cancelled,
        })
    }

    /// Free text prompt. `None` when cancelled.
    pub fn input(prompt: &str, initial: &str) -> Result<Option<String>> {
        let mut cmd = Command::new("fzf");
        cmd.env_remove("FZF_DEFAULT_OPTS")
            .arg("--print-query")
            .arg("--no-info")
            .arg("--prompt")
            .arg(format!("{prompt} "))
            .arg("--query")
            .arg(initial)
            .args(FzfOptions::input_margin_args());

        let output = spawn_fzf(cmd, "")?;
        if output.status.code() == Some(130) {
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .next()
            .map(|query| query.trim().to_string())
            .filter(|query| !query.is_empty()))
    }
}

/// One `<index>\t<text>` line per item. Line breaks and tabs in the text become spaces.
fn indexed_lines<T: FzfSelectable>(items: &[T]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let text = item.fzf_display_text().replace(['\n', '\r', '\t'], " ");
            format!("{index}\t{text}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn selected_index(line: &str) -> Option<usize> {
    line.split('\t').next()?.parse().ok()
}

fn spawn_fzf(mut cmd: Command, input: &str) -> Result<std::process::Output> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .context("Failed to start fzf. Is it installed?")?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(input.as_bytes())
            .context("Failed to send entries to fzf")?;
    }

    child.wait_with_output().context("Failed to wait for fzf")
}

/// Selected line, or `None` on Escape/empty output
fn run_with_input(cmd: Command, input: &str) -> Result<Option<String>> {
    let output = spawn_fzf(cmd, input)?;

    // 130: cancelled, 1: no match
    if matches!(output.status.code(), Some(130) | Some(1)) {
        return Ok(None);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .map(str::to_string)
        .find(|line| !line.is_empty()))
}
