//! Best-effort wallpaper application with a single-flight gate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::log::ApplyLog;
use super::pipeline::{PipelinePlan, PipelineReport, StageCommand, run_pipeline};
use super::rebind;
use super::settings::{Settings, ThemeHook};
use crate::ui::prelude::*;

/// External programs used by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub setter: String,
    pub scaler: String,
    pub interpreter: String,
    /// Fixed script location; `None` writes the bundled script to the data directory.
    pub rebind_script: Option<PathBuf>,
    pub theme_hook: Option<ThemeHook>,
}

impl ToolSet {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            setter: settings.setter.clone(),
            scaler: settings.scaler.clone(),
            interpreter: settings.interpreter.clone(),
            rebind_script: None,
            theme_hook: settings.theme_hook,
        }
    }

    fn plan(&self, image: &Path) -> PipelinePlan {
        let script = match &self.rebind_script {
            Some(path) => Ok(path.clone()),
            None => rebind::ensure_script().map_err(|e| format!("{e:#}")),
        };

        PipelinePlan {
            set_wallpaper: StageCommand::set_wallpaper(&self.setter, image),
            force_scale: StageCommand::force_scale(&self.scaler, image),
            input_rebind: script
                .map(|script| StageCommand::input_rebind(&self.interpreter, &script)),
            theme_hook: self
                .theme_hook
                .map(|hook| StageCommand::theme_hook(hook, image)),
        }
    }
}

/// Applies wallpapers one at a time.
///
/// Clones share the same gate: a request made while another pipeline is
/// running waits for it, and waiting requests run in arrival order.
#[derive(Debug, Clone)]
pub struct WallpaperApplier {
    tools: ToolSet,
    stage_timeout: Duration,
    log: Option<ApplyLog>,
    gate: Arc<Mutex<()>>,
}

impl WallpaperApplier {
    pub fn new(tools: ToolSet, stage_timeout: Duration) -> Self {
        Self {
            tools,
            stage_timeout,
            log: None,
            gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let applier = Self::new(ToolSet::from_settings(settings), settings.stage_timeout());
        match ApplyLog::open_default() {
            Ok(log) => applier.with_log(log),
            Err(e) => {
                emit(
                    Level::Warn,
                    "wallpaper.log.unavailable",
                    &format!("Pipeline failures will not be logged: {e:#}"),
                    None,
                );
                applier
            }
        }
    }

    pub fn with_log(mut self, log: ApplyLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Run the pipeline for `image`.
    ///
    /// Never fails: stage errors are reported through the returned report and
    /// the error log.
    pub async fn apply(&self, image: &Path) -> PipelineReport {
        let _turn = self.gate.lock().await;

        emit(
            Level::Debug,
            "wallpaper.apply.start",
            &format!("Applying {}", image.display()),
            None,
        );

        let report = run_pipeline(image, self.tools.plan(image), self.stage_timeout).await;
        self.record(&report);
        report
    }

    fn record(&self, report: &PipelineReport) {
        for failure in report.failures() {
            emit(
                Level::Debug,
                "wallpaper.stage.failed",
                &format!(
                    "{} failed: {}",
                    failure.stage,
                    failure.diagnostic().unwrap_or_default()
                ),
                None,
            );
        }

        if let Some(log) = &self.log
            && let Err(e) = log.record_failures(report)
        {
            emit(
                Level::Warn,
                "wallpaper.log.write_failed",
                &format!("Could not write apply log: {e:#}"),
                None,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallpaper::pipeline::Stage;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn executable(dir: &Path, name: &str, body: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn missing_tools(temp_dir: &TempDir) -> ToolSet {
        ToolSet {
            setter: "/nonexistent/guhwall-walrs".into(),
            scaler: "/nonexistent/guhwall-feh".into(),
            interpreter: "/nonexistent/guhwall-bash".into(),
            rebind_script: Some(temp_dir.path().join("input-rebind.sh")),
            theme_hook: None,
        }
    }

    #[tokio::test]
    async fn resolves_when_every_stage_fails() {
        let temp_dir = TempDir::new().unwrap();
        let log = ApplyLog::new(temp_dir.path().join("apply-errors.jsonl"));
        let applier = WallpaperApplier::new(missing_tools(&temp_dir), Duration::from_secs(5))
            .with_log(log.clone());

        let report = applier.apply(Path::new("/walls/a.png")).await;

        assert_eq!(report.stages.len(), 3);
        assert_eq!(report.failures().count(), 3);
        assert_eq!(log.entries().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn passes_image_to_setter_and_scaler() {
        let temp_dir = TempDir::new().unwrap();
        let calls = temp_dir.path().join("calls");
        let record = format!("echo \"$0 $*\" >> '{}'", calls.display());
        let tools = ToolSet {
            setter: executable(temp_dir.path(), "walrs", &record),
            scaler: executable(temp_dir.path(), "feh", &record),
            interpreter: "/bin/sh".into(),
            rebind_script: Some(PathBuf::from(executable(
                temp_dir.path(),
                "rebind.sh",
                &format!("echo rebind >> '{}'", calls.display()),
            ))),
            theme_hook: None,
        };
        let applier = WallpaperApplier::new(tools, Duration::from_secs(5));

        let report = applier.apply(Path::new("/walls/my wall.png")).await;
        assert!(report.all_succeeded(), "{report:?}");

        let calls = fs::read_to_string(&calls).unwrap();
        let lines: Vec<&str> = calls.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("walrs -i /walls/my wall.png"));
        assert!(lines[1].ends_with("feh --bg-scale /walls/my wall.png"));
        assert_eq!(lines[2], "rebind");
    }

    #[tokio::test]
    async fn later_stages_run_after_a_failed_setter() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("scaled");
        let tools = ToolSet {
            setter: executable(temp_dir.path(), "walrs", "echo 'no X display' >&2; exit 1"),
            scaler: executable(
                temp_dir.path(),
                "feh",
                &format!("touch '{}'", marker.display()),
            ),
            interpreter: "/bin/sh".into(),
            rebind_script: Some(PathBuf::from(executable(temp_dir.path(), "rebind.sh", "exit 0"))),
            theme_hook: None,
        };
        let applier = WallpaperApplier::new(tools, Duration::from_secs(5));

        let report = applier.apply(Path::new("/walls/a.png")).await;

        assert!(marker.exists());
        let set = report.stage(Stage::SetWallpaper).unwrap();
        assert!(set.diagnostic().unwrap().contains("no X display"));
        assert!(report.stage(Stage::ForceScale).unwrap().succeeded());
        assert!(report.stage(Stage::InputRebind).unwrap().succeeded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_requests_run_one_at_a_time_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let trace = temp_dir.path().join("trace");
        let current = temp_dir.path().join("current");
        let setter_body = format!(
            "echo \"start $2\" >> '{trace}'\nsleep 0.2\necho \"$2\" > '{current}'\necho \"end $2\" >> '{trace}'",
            trace = trace.display(),
            current = current.display()
        );
        let tools = ToolSet {
            setter: executable(temp_dir.path(), "walrs", &setter_body),
            scaler: "true".into(),
            interpreter: "/bin/sh".into(),
            rebind_script: Some(PathBuf::from(executable(temp_dir.path(), "rebind.sh", "exit 0"))),
            theme_hook: None,
        };
        let applier = WallpaperApplier::new(tools, Duration::from_secs(5));

        let first = applier.clone();
        let second = applier.clone();
        let (a, b) = tokio::join!(
            async move { first.apply(Path::new("/walls/a.png")).await },
            async move { second.apply(Path::new("/walls/b.png")).await },
        );
        assert!(a.all_succeeded());
        assert!(b.all_succeeded());

        let trace = fs::read_to_string(&trace).unwrap();
        assert_eq!(
            trace.lines().collect::<Vec<_>>(),
            vec![
                "start /walls/a.png",
                "end /walls/a.png",
                "start /walls/b.png",
                "end /walls/b.png"
            ]
        );
        // Last request wins
        assert_eq!(fs::read_to_string(&current).unwrap().trim(), "/walls/b.png");
    }
}
