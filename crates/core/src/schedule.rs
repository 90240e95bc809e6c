//! Recurring schedule computation.
//!
//! Pure logic: given the current instant, a recurrence, and the civil
//! offset, compute the next absolute fire time. Timer registration and
//! self-renewal live in the events crate.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::factory::DAILY_DEVOTION_ID;
use crate::notification::NotificationCategory;
use crate::preferences::{ClockTime, NotificationPreferences};
use crate::types::Timestamp;

/// How far ahead to search for a matching day before giving up.
const MAX_LOOKAHEAD_DAYS: i64 = 400;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
}

/// Recurrence rule for a periodic notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recurrence {
    pub pattern: RecurrencePattern,
    /// Weekly only: 0 = Sunday through 6 = Saturday. Empty means every day.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<u8>,
    /// Monthly only: day of month, clamped to the month's length. Defaults to 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_month: Option<u32>,
    /// Local fire time.
    pub time: ClockTime,
    /// Skip days for which [`calendar::is_holiday`] is true.
    #[serde(default)]
    pub skip_holidays: bool,
}

impl Recurrence {
    pub fn daily(time: ClockTime) -> Self {
        Self {
            pattern: RecurrencePattern::Daily,
            days_of_week: Vec::new(),
            day_of_month: None,
            time,
            skip_holidays: false,
        }
    }

    /// Whether `date` is a day this recurrence fires on.
    fn matches(&self, date: NaiveDate) -> bool {
        if self.skip_holidays && calendar::is_holiday(date) {
            return false;
        }
        match self.pattern {
            RecurrencePattern::Daily => true,
            RecurrencePattern::Weekly => {
                let weekday = date.weekday().num_days_from_sunday() as u8;
                self.days_of_week.is_empty() || self.days_of_week.contains(&weekday)
            }
            RecurrencePattern::Monthly => {
                let wanted = self.day_of_month.unwrap_or(1).max(1);
                date.day() == wanted.min(days_in_month(date))
            }
        }
    }
}

/// The next firing of one recurring notification kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSchedule {
    pub id: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    /// Absolute next fire instant.
    pub scheduled_time: Timestamp,
    /// Civil offset the schedule was computed in, e.g. `+08:00`.
    pub time_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn days_in_month(date: NaiveDate) -> u32 {
    let (y, m) = (date.year(), date.month());
    let first_next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    first_next
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// `date` at `time` in `tz`, as a UTC instant.
fn at_local(date: NaiveDate, time: ClockTime, tz: FixedOffset) -> Option<DateTime<Utc>> {
    date.and_time(time.as_naive())
        .and_local_timezone(tz)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Next instant strictly after `now` at which `recurrence` fires.
///
/// Returns `None` if no matching day exists within the lookahead window
/// (e.g. every candidate day is a skipped holiday).
pub fn next_fire(now: Timestamp, recurrence: &Recurrence, tz: FixedOffset) -> Option<Timestamp> {
    let today = now.with_timezone(&tz).date_naive();
    (0..MAX_LOOKAHEAD_DAYS)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .filter(|date| recurrence.matches(*date))
        .filter_map(|date| at_local(date, recurrence.time, tz))
        .find(|candidate| *candidate > now)
}

/// Today at `time` in `tz`, or tomorrow if that is not after `now`.
pub fn next_daily_fire(now: Timestamp, time: ClockTime, tz: FixedOffset) -> Option<Timestamp> {
    next_fire(now, &Recurrence::daily(time), tz)
}

/// Next listed weekday (0 = Sunday) at `time` strictly after `now`.
pub fn next_weekly_fire(
    now: Timestamp,
    days_of_week: &[u8],
    time: ClockTime,
    tz: FixedOffset,
) -> Option<Timestamp> {
    let recurrence = Recurrence {
        pattern: RecurrencePattern::Weekly,
        days_of_week: days_of_week.to_vec(),
        ..Recurrence::daily(time)
    };
    next_fire(now, &recurrence, tz)
}

/// Next `day_of_month` (clamped to the month's length) at `time`.
pub fn next_monthly_fire(
    now: Timestamp,
    day_of_month: u32,
    time: ClockTime,
    tz: FixedOffset,
) -> Option<Timestamp> {
    let recurrence = Recurrence {
        pattern: RecurrencePattern::Monthly,
        day_of_month: Some(day_of_month),
        ..Recurrence::daily(time)
    };
    next_fire(now, &recurrence, tz)
}

/// All recurring schedules the preferences call for, computed fresh.
///
/// Currently this is the daily devotion, present only while both the
/// master switch and the devotion block are enabled.
pub fn compute_schedules(
    prefs: &NotificationPreferences,
    now: Timestamp,
    tz: FixedOffset,
) -> Vec<NotificationSchedule> {
    let mut schedules = Vec::new();

    if prefs.enabled && prefs.devotions.enabled {
        let mut recurrence = Recurrence::daily(prefs.devotions.preferred_time);
        recurrence.skip_holidays = prefs.devotions.skip_holidays;
        if let Some(scheduled_time) = next_fire(now, &recurrence, tz) {
            schedules.push(NotificationSchedule {
                id: DAILY_DEVOTION_ID.to_string(),
                category: NotificationCategory::Devotion,
                scheduled_time,
                time_zone: tz.to_string(),
                recurrence: Some(recurrence),
            });
        }
    }

    schedules
}
