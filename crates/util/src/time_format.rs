//! # Time Formatting
//!
//! Formatting helpers for the clock times returned by class search and for
//! human-readable wait durations in logs.

use std::time::Duration;

/// Converts a four-digit 24-hour clock time (`"1330"`) into `"1:30 PM"`.
///
/// Returns an empty string when the input is not exactly four characters or the
/// hour is out of range, so missing meeting times render as blank cells.
///
/// # Example
/// ```rust
/// use veil_util::format_clock_time_12h;
///
/// assert_eq!(format_clock_time_12h("0000"), "12:00 AM");
/// assert_eq!(format_clock_time_12h("0930"), "9:30 AM");
/// assert_eq!(format_clock_time_12h("1200"), "12:00 PM");
/// assert_eq!(format_clock_time_12h("1745"), "5:45 PM");
/// assert_eq!(format_clock_time_12h(""), "");
/// ```
pub fn format_clock_time_12h(input: &str) -> String {
    if input.len() != 4 || !input.is_ascii() {
        return String::new();
    }
    let Ok(hour) = input[..2].parse::<u32>() else {
        return String::new();
    };
    if hour > 23 {
        return String::new();
    }
    let minutes = &input[2..];

    match hour {
        0 => format!("12:{minutes} AM"),
        12 => format!("12:{minutes} PM"),
        1..=11 => format!("{hour}:{minutes} AM"),
        _ => format!("{}:{minutes} PM", hour - 12),
    }
}

/// Formats a duration as `"{days}d {hours}h {minutes}m {seconds}s"`.
///
/// Sub-second precision is dropped.
pub fn format_wait_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / (60 * 60 * 24);
    let hours = (total_seconds % (60 * 60 * 24)) / (60 * 60);
    let minutes = (total_seconds % (60 * 60)) / 60;
    let seconds = total_seconds % 60;

    format!("{days}d {hours}h {minutes}m {seconds}s")
}
