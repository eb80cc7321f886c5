//! The three-stage wallpaper pipeline.
//!
//! Stages always run in order: set the wallpaper, force the background
//! scaling, then rebind X11 input devices. A failing stage is recorded and the
//! next stage still runs.

use serde::Serialize;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

use super::settings::ThemeHook;

/// Longest stderr excerpt kept in a diagnostic.
const MAX_DIAGNOSTIC_LEN: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    SetWallpaper,
    ForceScale,
    InputRebind,
    ThemeHook,
}

impl Stage {
    /// Stages every run goes through, in order
    pub const CORE: [Stage; 3] = [Stage::SetWallpaper, Stage::ForceScale, Stage::InputRebind];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::SetWallpaper => "set-wallpaper",
            Stage::ForceScale => "force-scale",
            Stage::InputRebind => "input-rebind",
            Stage::ThemeHook => "theme-hook",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StageError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {}: {stderr}", describe_exit(.code))]
    Exit {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{program} did not finish within {}s and was killed", whole_secs(.limit))]
    Timeout { program: String, limit: Duration },

    #[error("input rebind script unavailable: {0}")]
    Script(String),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

fn whole_secs(limit: &Duration) -> u64 {
    limit.as_secs()
}

impl StageError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            StageError::Exit { code, .. } => *code,
            _ => None,
        }
    }
}

/// Program plus argument array for one stage. Never passed through a shell.
#[derive(Debug, Clone)]
pub struct StageCommand {
    pub program: String,
    pub args: Vec<OsString>,
}

impl StageCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// `<setter> -i <image>`
    pub fn set_wallpaper(setter: &str, image: &Path) -> Self {
        Self::new(setter).arg("-i").arg(image)
    }

    /// `<scaler> --bg-scale <image>`
    pub fn force_scale(scaler: &str, image: &Path) -> Self {
        Self::new(scaler).arg("--bg-scale").arg(image)
    }

    /// `<interpreter> <script>`
    pub fn input_rebind(interpreter: &str, script: &Path) -> Self {
        Self::new(interpreter).arg(script)
    }

    /// `wal -i <image> -n` or `matugen image <image>`
    pub fn theme_hook(hook: ThemeHook, image: &Path) -> Self {
        match hook {
            ThemeHook::Pywal => Self::new(hook.program()).arg("-i").arg(image).arg("-n"),
            ThemeHook::Matugen => Self::new(hook.program()).arg("image").arg(image),
        }
    }

    /// Run to completion, killing the process if it outlives `limit`.
    pub async fn run(&self, limit: Duration) -> Result<(), StageError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StageError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let output = match timeout(limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(source)) => {
                return Err(StageError::Spawn {
                    program: self.program.clone(),
                    source,
                });
            }
            Err(_) => {
                return Err(StageError::Timeout {
                    program: self.program.clone(),
                    limit,
                });
            }
        };

        if output.status.success() {
            Ok(())
        } else {
            Err(StageError::Exit {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: truncate_diagnostic(String::from_utf8_lossy(&output.stderr).trim()),
            })
        }
    }
}

fn truncate_diagnostic(stderr: &str) -> String {
    if stderr.len() <= MAX_DIAGNOSTIC_LEN {
        return stderr.to_string();
    }
    let mut end = MAX_DIAGNOSTIC_LEN;
    while !stderr.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &stderr[..end])
}

#[derive(Debug)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: Result<(), StageError>,
    pub elapsed: Duration,
}

impl StageReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn diagnostic(&self) -> Option<String> {
        self.outcome.as_ref().err().map(|e| e.to_string())
    }
}

/// Outcome of one `apply` call, stage by stage.
#[derive(Debug)]
pub struct PipelineReport {
    pub image: PathBuf,
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    pub fn new(image: impl Into<PathBuf>) -> Self {
        Self {
            image: image.into(),
            stages: Vec::with_capacity(Stage::CORE.len() + 1),
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.stages.iter().all(StageReport::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageReport> {
        self.stages.iter().filter(|s| !s.succeeded())
    }

    #[cfg(test)]
    pub fn stage(&self, stage: Stage) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "image": self.image,
            "all_succeeded": self.all_succeeded(),
            "stages": self.stages.iter().map(|s| serde_json::json!({
                "stage": s.stage,
                "ok": s.succeeded(),
                "elapsed_ms": s.elapsed.as_millis() as u64,
                "diagnostic": s.diagnostic(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// Commands for one pipeline run, or the reason a stage cannot be prepared.
pub struct PipelinePlan {
    pub set_wallpaper: StageCommand,
    pub force_scale: StageCommand,
    pub input_rebind: Result<StageCommand, String>,
    pub theme_hook: Option<StageCommand>,
}

/// Run every stage in order; never short-circuits.
///
/// The theme hook, when planned, runs last.
pub async fn run_pipeline(image: &Path, plan: PipelinePlan, limit: Duration) -> PipelineReport {
    let mut report = PipelineReport::new(image);

    let stages = [
        (Stage::SetWallpaper, Ok(plan.set_wallpaper)),
        (Stage::ForceScale, Ok(plan.force_scale)),
        (Stage::InputRebind, plan.input_rebind),
    ];

    let hook = plan.theme_hook.map(|command| (Stage::ThemeHook, Ok::<_, String>(command)));

    for (stage, command) in stages.into_iter().chain(hook) {
        let started = Instant::now();
        let outcome = match command {
            Ok(command) => command.run(limit).await,
            Err(reason) => Err(StageError::Script(reason)),
        };
        report.stages.push(StageReport {
            stage,
            outcome,
            elapsed: started.elapsed(),
        });
    }

    report
}
