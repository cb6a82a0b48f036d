//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current time as whole seconds since the Unix epoch
pub fn now_epoch_seconds() -> i64 {
    now().timestamp()
}

/// Format a countdown in seconds as `H:MM:SS`
///
/// Negative values are clamped to zero; a countdown never shows a negative wait.
///
/// ```
/// use lumen_common::time::format_countdown;
///
/// assert_eq!(format_countdown(86400), "24:00:00");
/// assert_eq!(format_countdown(3661), "1:01:01");
/// assert_eq!(format_countdown(-5), "0:00:00");
/// ```
pub fn format_countdown(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let hours = seconds / 3600;
    let mins = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{}:{:02}:{:02}", hours, mins, secs)
}
