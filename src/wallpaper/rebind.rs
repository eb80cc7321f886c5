//! Input rebind script asset.
//!
//! The script ships inside the binary and is written next to the other
//! guhwall data so the interpreter can run it as a plain file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::common::paths;

pub const INPUT_REBIND_SCRIPT: &str = include_str!("../../assets/input-rebind.sh");

/// Write the script to the data directory and return its path.
pub fn ensure_script() -> Result<PathBuf> {
    let path = paths::input_rebind_script()?;
    write_if_changed(&path, INPUT_REBIND_SCRIPT)?;
    Ok(path)
}

pub fn write_if_changed(path: &Path, contents: &str) -> Result<()> {
    let should_write = match fs::read_to_string(path) {
        Ok(existing) => existing != contents,
        Err(_) => true,
    };

    if should_write {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to prepare directory for {}", parent.display()))?;
        }

        fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}
