//! Formatting helpers shared by the TUI and the export CLI.

use chrono::{DateTime, Local, Utc};

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.with_timezone(&Local).format("%b %d").to_string()
    }
}

/// "Autosaved at 14:02:11", or "Not saved yet".
pub fn autosave_label(last_saved: Option<DateTime<Utc>>) -> String {
    match last_saved {
        Some(ts) => format!("Autosaved at {}", ts.with_timezone(&Local).format("%H:%M:%S")),
        None => "Not saved yet".to_string(),
    }
}

/// Percentage with one decimal ("33.3%").
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}
