use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::pipeline::PipelineReport;
use crate::common::paths;

/// One failed pipeline stage, stored as a JSON line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApplyLogEntry {
    pub timestamp: DateTime<Utc>,
    pub image: String,
    pub stage: String,
    pub diagnostic: String,
    pub exit_code: Option<i32>,
}

/// Append-only error log for the wallpaper pipeline.
#[derive(Debug, Clone)]
pub struct ApplyLog {
    log_file: PathBuf,
}

impl ApplyLog {
    pub fn new(log_file: impl Into<PathBuf>) -> Self {
        Self {
            log_file: log_file.into(),
        }
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(paths::apply_log_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.log_file
    }

    /// Record every failed stage of `report`. Returns how many were written.
    pub fn record_failures(&self, report: &PipelineReport) -> Result<usize> {
        let now = Utc::now();
        let entries: Vec<ApplyLogEntry> = report
            .failures()
            .map(|stage| ApplyLogEntry {
                timestamp: now,
                image: report.image.to_string_lossy().into_owned(),
                stage: stage.stage.to_string(),
                diagnostic: stage.diagnostic().unwrap_or_default(),
                exit_code: stage.outcome.as_ref().err().and_then(|e| e.exit_code()),
            })
            .collect();

        if entries.is_empty() {
            return Ok(0);
        }

        if let Some(parent) = self.log_file.parent() {
            create_dir_all(parent).context("Failed to create apply log directory")?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .context("Failed to open apply log file")?;

        for entry in &entries {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize apply log entry")?;
            writeln!(file, "{json_line}").context("Failed to write to apply log file")?;
        }

        Ok(entries.len())
    }

    /// Entries newest first. Lines that fail to parse are skipped.
    pub fn entries(&self) -> Result<Vec<ApplyLogEntry>> {
        if !self.log_file.exists() {
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.log_file).context("Failed to read apply log file")?;

        let mut entries: Vec<ApplyLogEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        entries.reverse();
        Ok(entries)
    }

    pub fn clear(&self) -> Result<()> {
        if self.log_file.exists() {
            std::fs::remove_file(&self.log_file).context("Failed to remove apply log file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallpaper::pipeline::{Stage, StageError, StageReport};
    use std::time::Duration;
    use tempfile::TempDir;

    fn report_with(outcomes: Vec<(Stage, Result<(), StageError>)>) -> PipelineReport {
        let mut report = PipelineReport::new("/walls/night sky.png");
        for (stage, outcome) in outcomes {
            report.stages.push(StageReport {
                stage,
                outcome,
                elapsed: Duration::from_millis(5),
            });
        }
        report
    }

    #[test]
    fn clean_runs_write_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let log = ApplyLog::new(temp_dir.path().join("log/apply-errors.jsonl"));

        let report = report_with(Stage::CORE.iter().map(|s| (*s, Ok(()))).collect());
        assert_eq!(log.record_failures(&report).unwrap(), 0);
        assert!(!log.path().exists());
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn failures_are_appended_and_read_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let log = ApplyLog::new(temp_dir.path().join("log/apply-errors.jsonl"));

        let first = report_with(vec![
            (
                Stage::SetWallpaper,
                Err(StageError::Exit {
                    program: "walrs".into(),
                    code: Some(2),
                    stderr: "cannot open display".into(),
                }),
            ),
            (Stage::ForceScale, Ok(())),
            (Stage::InputRebind, Ok(())),
        ]);
        let second = report_with(vec![
            (Stage::SetWallpaper, Ok(())),
            (Stage::ForceScale, Ok(())),
            (
                Stage::InputRebind,
                Err(StageError::Timeout {
                    program: "/bin/bash".into(),
                    limit: Duration::from_secs(30),
                }),
            ),
        ]);

        assert_eq!(log.record_failures(&first).unwrap(), 1);
        assert_eq!(log.record_failures(&second).unwrap(), 1);

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].stage, "input-rebind");
        assert_eq!(entries[0].exit_code, None);
        assert_eq!(entries[1].stage, "set-wallpaper");
        assert_eq!(entries[1].exit_code, Some(2));
        assert!(entries[1].diagnostic.contains("cannot open display"));
        assert_eq!(entries[1].image, "/walls/night sky.png");

        log.clear().unwrap();
        assert!(log.entries().unwrap().is_empty());
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("apply-errors.jsonl");
        let entry = ApplyLogEntry {
            timestamp: Utc::now(),
            image: "/walls/a.png".into(),
            stage: "force-scale".into(),
            diagnostic: "feh exited with code 1".into(),
            exit_code: Some(1),
        };
        std::fs::write(
            &path,
            format!("{{truncated\n{}\n\n", serde_json::to_string(&entry).unwrap()),
        )
        .unwrap();

        let entries = ApplyLog::new(&path).entries().unwrap();
        assert_eq!(entries, vec![entry]);
    }
}
