//! `guhwall doctor`: which external tools are reachable.

use colored::*;
use comfy_table::{Cell, Color, Table, presets::UTF8_FULL};

use super::settings::Settings;
use crate::common::requirements::InstallTest;
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    Pass,
    Fail,
    Warning,
}

impl CheckStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Warning => "WARN",
        }
    }

    fn color(&self) -> Color {
        match self {
            CheckStatus::Pass => Color::Green,
            CheckStatus::Fail => Color::Red,
            CheckStatus::Warning => Color::Yellow,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolCheck {
    pub tool: String,
    pub role: &'static str,
    pub required: bool,
    pub test: InstallTest,
}

#[derive(Debug, Clone)]
pub struct CheckResult {
    pub tool: String,
    pub role: &'static str,
    pub status: CheckStatus,
}

/// Checks for the configured pipeline tools plus the gallery helpers.
pub fn checks_for(settings: &Settings) -> Vec<ToolCheck> {
    let mut checks = vec![
        ToolCheck {
            tool: settings.setter.clone(),
            role: "wallpaper setter",
            required: true,
            test: InstallTest::for_program(&settings.setter),
        },
        ToolCheck {
            tool: settings.scaler.clone(),
            role: "scale forcer",
            required: true,
            test: InstallTest::for_program(&settings.scaler),
        },
        ToolCheck {
            tool: settings.interpreter.clone(),
            role: "rebind script interpreter",
            required: true,
            test: InstallTest::for_program(&settings.interpreter),
        },
    ];

    if let Some(hook) = settings.theme_hook {
        checks.push(ToolCheck {
            tool: hook.program().to_string(),
            role: "theme hook",
            required: true,
            test: InstallTest::WhichSucceeds(hook.program().to_string()),
        });
    }

    let helpers: [(&str, &'static str, bool); 6] = [
        ("xinput", "input device rebinding", true),
        ("xdotool", "window manager key chord", true),
        ("fzf", "gallery", true),
        ("chafa", "gallery image preview", false),
        ("notify-send", "status notifications", false),
        ("zenity", "folder dialog", false),
    ];
    checks.extend(helpers.into_iter().map(|(tool, role, required)| ToolCheck {
        tool: tool.to_string(),
        role,
        required,
        test: InstallTest::WhichSucceeds(tool.to_string()),
    }));

    checks.push(ToolCheck {
        tool: "xinput list".to_string(),
        role: "X11 display reachable",
        required: false,
        test: InstallTest::CommandSucceeds {
            program: "xinput".to_string(),
            args: vec!["list".to_string()],
        },
    });

    checks
}

pub fn run_checks(checks: &[ToolCheck]) -> Vec<CheckResult> {
    checks
        .iter()
        .map(|check| CheckResult {
            tool: check.tool.clone(),
            role: check.role,
            status: match (check.test.run(), check.required) {
                (true, _) => CheckStatus::Pass,
                (false, true) => CheckStatus::Fail,
                (false, false) => CheckStatus::Warning,
            },
        })
        .collect()
}

pub fn print_results(results: &[CheckResult]) {
    if get_output_format() == OutputFormat::Json {
        for result in results {
            emit(
                Level::Info,
                "doctor.check",
                &format!("{}: {}", result.tool, result.status.label()),
                Some(serde_json::json!({
                    "tool": result.tool,
                    "role": result.role,
                    "status": result.status.label(),
                })),
            );
        }
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Tool", "Used for", "Status"]);
    for result in results {
        table.add_row(vec![
            Cell::new(&result.tool),
            Cell::new(result.role),
            Cell::new(result.status.label()).fg(result.status.color()),
        ]);
    }
    println!("{table}");

    let failed = results
        .iter()
        .filter(|r| r.status == CheckStatus::Fail)
        .count();
    if failed == 0 {
        println!("{}", "All required tools are available".green());
    } else {
        println!(
            "{}",
            format!("{failed} required tool(s) missing; affected stages will fail").yellow()
        );
    }
}
