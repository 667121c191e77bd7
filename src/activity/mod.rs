//! Activity log: one timestamped line per session, cycle, endpoint, and
//! command event.
//!
//! Log file: `~/.apiview/activity.log`
//!
//! Best-effort: any I/O failure is silently ignored so logging never affects
//! a poll cycle.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;

static ENABLED: AtomicBool = AtomicBool::new(true);

/// Turn the activity log on or off for the rest of the process.
pub fn set_enabled(enabled: bool) {
    ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Append one event line.
pub fn log_event(message: &str) {
    if !is_enabled() {
        return;
    }

    let Some(log_path) = activity_log_path() else {
        return;
    };

    if let Some(parent) = log_path.parent()
        && create_dir_all(parent).is_err()
    {
        return;
    }

    let Ok(mut file) = OpenOptions::new().create(true).append(true).open(log_path) else {
        return;
    };

    let _ = writeln!(file, "{}", format_line(&Utc::now().to_rfc3339(), message));
}

/// Path to the activity log file.
pub fn activity_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".apiview").join("activity.log"))
}

/// Collapse line breaks so every event stays on one line.
fn format_line(timestamp: &str, message: &str) -> String {
    format!("{} {}", timestamp, message.replace(['\r', '\n'], " "))
}
