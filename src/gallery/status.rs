//! Transient status messages ("Applying…", "Wallpaper Applied!").

use std::process::{Command, Stdio};
use std::time::Duration;

use crate::ui::prelude::*;

/// How long a status message stays visible
pub const STATUS_DISPLAY: Duration = Duration::from_secs(2);

pub const APPLYING: &str = "Applying…";
pub const APPLIED: &str = "Wallpaper Applied!";
pub const FAILED: &str = "Error: wallpaper could not be applied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Progress,
    Success,
    Error,
}

impl StatusKind {
    fn level(self) -> Level {
        match self {
            StatusKind::Progress => Level::Info,
            StatusKind::Success => Level::Success,
            StatusKind::Error => Level::Error,
        }
    }

    fn urgency(self) -> &'static str {
        match self {
            StatusKind::Error => "critical",
            _ => "low",
        }
    }

    fn code(self) -> &'static str {
        match self {
            StatusKind::Progress => "gallery.status.progress",
            StatusKind::Success => "gallery.status.success",
            StatusKind::Error => "gallery.status.error",
        }
    }
}

/// Shows status messages in the terminal and, optionally, as notifications.
#[derive(Debug, Clone)]
pub struct StatusToast {
    notifications: bool,
}

impl StatusToast {
    pub fn new(notifications: bool) -> Self {
        Self {
            notifications: notifications && which::which("notify-send").is_ok(),
        }
    }

    pub fn show(&self, kind: StatusKind, message: &str) {
        self.print(kind, message);
        self.notify(kind, message);
    }

    /// Terminal only; safe while no menu is drawn
    pub fn print(&self, kind: StatusKind, message: &str) {
        emit(kind.level(), kind.code(), message, None);
    }

    /// Desktop notification only; safe while a menu owns the terminal
    pub fn notify(&self, kind: StatusKind, message: &str) {
        if self.notifications {
            // Same tag, so each message replaces the previous one
            let _ = Command::new("notify-send")
                .args(notify_args(kind, message))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn();
        }
    }
}

fn notify_args(kind: StatusKind, message: &str) -> Vec<String> {
    vec![
        "--app-name=guhwall".to_string(),
        format!("--expire-time={}", STATUS_DISPLAY.as_millis()),
        format!("--urgency={}", kind.urgency()),
        "--hint=string:x-canonical-private-synchronous:guhwall-status".to_string(),
        "guhwall".to_string(),
        message.to_string(),
    ]
}
