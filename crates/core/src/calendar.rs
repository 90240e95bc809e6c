//! Quiet-hours and holiday predicates.
//!
//! Pure logic. Times are evaluated in the deployment's fixed civil offset,
//! which the caller passes in.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Utc};

use crate::preferences::QuietHours;

// ---------------------------------------------------------------------------
// Quiet hours
// ---------------------------------------------------------------------------

/// Whether the local time-of-day `t` falls inside `window`.
///
/// The window is half-open, `[start, end)`. When `start >= end` it wraps
/// midnight.
pub fn is_time_in_quiet_hours(t: NaiveTime, window: &QuietHours) -> bool {
    if !window.enabled {
        return false;
    }
    let start = window.start.as_naive();
    let end = window.end.as_naive();
    if start < end {
        start <= t && t < end
    } else {
        t >= start || t < end
    }
}

/// Whether `now` falls inside `window` in the civil offset `tz`.
pub fn is_in_quiet_hours(now: DateTime<Utc>, window: &QuietHours, tz: FixedOffset) -> bool {
    is_time_in_quiet_hours(now.with_timezone(&tz).time(), window)
}

// ---------------------------------------------------------------------------
// Holidays
// ---------------------------------------------------------------------------

/// Fixed annual holidays as (month, day): New Year's Day, Christmas,
/// Boxing Day.
const FIXED_HOLIDAYS: [(u32, u32); 3] = [(1, 1), (12, 25), (12, 26)];

/// Easter Sunday per year as (year, month, day).
const EASTER_SUNDAYS: [(i32, u32, u32); 7] = [
    (2024, 3, 31),
    (2025, 4, 20),
    (2026, 4, 5),
    (2027, 3, 28),
    (2028, 4, 16),
    (2029, 4, 1),
    (2030, 4, 21),
];

/// Offsets from Easter Sunday, in days: Good Friday, Holy Saturday, Easter
/// Sunday, Easter Monday.
const EASTER_OFFSETS: [i64; 4] = [-2, -1, 0, 1];

/// Easter Sunday for `year`, if the year is in the table.
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    EASTER_SUNDAYS
        .iter()
        .find(|(y, _, _)| *y == year)
        .and_then(|(y, m, d)| NaiveDate::from_ymd_opt(*y, *m, *d))
}

/// Easter-derived holidays for `year`. Empty for years outside the table.
pub fn movable_holidays(year: i32) -> Vec<NaiveDate> {
    match easter_sunday(year) {
        Some(easter) => EASTER_OFFSETS
            .iter()
            .map(|offset| easter + Duration::days(*offset))
            .collect(),
        None => Vec::new(),
    }
}

/// Whether `date` is a fixed or movable holiday.
pub fn is_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS.contains(&(date.month(), date.day()))
        || movable_holidays(date.year()).contains(&date)
}
