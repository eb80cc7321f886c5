use anyhow::Result;
use std::process::Command;

use super::common::TestEnvironment;

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Parse each stdout line as one JSON event.
    pub fn events(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn events_with_code(&self, code: &str) -> Vec<serde_json::Value> {
        self.events()
            .into_iter()
            .filter(|event| event["code"] == code)
            .collect()
    }
}

pub fn run_guhwall(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_guhwall"))
        .args(args)
        .env("XDG_CONFIG_HOME", env.config_home())
        .env("XDG_DATA_HOME", env.data_home())
        .env_remove("DISPLAY")
        .current_dir(env.path())
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

/// Run with `--output json` prepended.
pub fn run_guhwall_json(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let mut full = vec!["--output", "json"];
    full.extend_from_slice(args);
    run_guhwall(env, &full)
}
