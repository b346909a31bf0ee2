//! Time-of-day helpers.
//!
//! The engine works in whole minutes from midnight. These helpers convert
//! between that representation and `HH:MM` text, and snap values to the
//! 15-minute booking grid.

use crate::error::ScheduleError;
use chrono::{NaiveTime, Timelike};

/// Granularity of every start time and duration the engine proposes.
pub const GRID_MINUTES: u32 = 15;

/// Minutes in a day; the exclusive upper bound for a time of day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parse `HH:MM` (or `H:MM`) into minutes from midnight.
///
/// `24:00` is accepted as end-of-day.
pub fn parse_hhmm(text: &str) -> Result<u32, ScheduleError> {
    let text = text.trim();
    if text == "24:00" {
        return Ok(MINUTES_PER_DAY);
    }
    NaiveTime::parse_from_str(text, "%H:%M")
        .map(minutes_of)
        .map_err(|_| ScheduleError::InvalidTime(text.to_string()))
}

/// Parse `HH:MM-HH:MM` into a `(start, end)` pair, rejecting inverted spans.
pub fn parse_span(text: &str) -> Result<(u32, u32), ScheduleError> {
    let (start, end) = text
        .split_once('-')
        .ok_or_else(|| ScheduleError::InvalidTime(text.to_string()))?;
    let start = parse_hhmm(start)?;
    let end = parse_hhmm(end)?;
    if end < start {
        return Err(ScheduleError::InvalidInterval {
            start: start.into(),
            end: end.into(),
        });
    }
    Ok((start, end))
}

/// Render minutes from midnight as `HH:MM`.
pub fn format_hhmm(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Minutes from midnight for a `NaiveTime` (seconds are dropped).
pub fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Round a minute count to the nearest grid multiple, halves rounding up.
pub fn round_to_grid(minutes: f64) -> i64 {
    let grid = f64::from(GRID_MINUTES);
    ((minutes / grid).round() * grid) as i64
}

/// Round a time of day up to the next grid boundary (identity on the grid).
pub fn ceil_to_grid(minutes: u32) -> u32 {
    minutes.div_ceil(GRID_MINUTES) * GRID_MINUTES
}
