//! Per-user notification preferences.
//!
//! One [`NotificationPreferences`] value exists per user key. The whole
//! structure is replaced on every write; there is no patch API. Missing
//! fields in stored JSON resolve to defaults at read time, so a reader
//! always observes exactly one value per field.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::Validate;

use crate::error::CoreError;
use crate::i18n::Language;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default daily cap on delivered notifications.
pub const DEFAULT_MAX_PER_DAY: u32 = 10;

/// Longest accepted event reminder lead time (one week, in minutes).
pub const MAX_EVENT_LEAD_MINUTES: u32 = 7 * 24 * 60;

// ---------------------------------------------------------------------------
// ClockTime
// ---------------------------------------------------------------------------

/// A wall-clock time of day with minute precision, written as `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Build from hour and minute. Returns `None` when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive(self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Validation(format!("Invalid time '{s}'. Expected HH:MM"));
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(invalid());
        }
        let hour: u32 = h.parse().map_err(|_| invalid())?;
        let minute: u32 = m.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn clock(hour: u32, minute: u32) -> ClockTime {
    // Only called with literal, in-range values.
    ClockTime::new(hour, minute).unwrap_or(ClockTime(NaiveTime::MIN))
}

// ---------------------------------------------------------------------------
// Category blocks
// ---------------------------------------------------------------------------

/// Daily devotion delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevotionPreferences {
    pub enabled: bool,
    /// Local wall-clock time the daily devotion is delivered.
    pub preferred_time: ClockTime,
    pub language: Language,
    /// Skip the daily devotion on holidays.
    pub skip_holidays: bool,
}

impl Default for DevotionPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            preferred_time: clock(7, 0),
            language: Language::En,
            skip_holidays: false,
        }
    }
}

/// Event reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPreferences {
    pub enabled: bool,
    /// Minutes before an event start at which reminders go out.
    #[validate(length(max = 5))]
    pub reminder_lead_minutes: Vec<u32>,
    pub language: Language,
}

impl Default for EventPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            reminder_lead_minutes: vec![60, 24 * 60],
            language: Language::En,
        }
    }
}

/// Prayer request settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrayerPreferences {
    pub enabled: bool,
    /// Only deliver prayer requests marked urgent.
    pub urgent_only: bool,
    pub language: Language,
}

impl Default for PrayerPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            urgent_only: false,
            language: Language::En,
        }
    }
}

/// Small-group and church-wide community settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommunityPreferences {
    pub enabled: bool,
    pub group_messages: bool,
    pub announcements: bool,
    pub new_members: bool,
    pub language: Language,
}

impl Default for CommunityPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            group_messages: true,
            announcements: true,
            new_members: true,
            language: Language::En,
        }
    }
}

/// Local time window in which non-urgent notifications are held back.
///
/// `start > end` describes an overnight window (e.g. 22:00 to 07:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuietHours {
    pub enabled: bool,
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: true,
            start: clock(22, 0),
            end: clock(7, 0),
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationPreferences
// ---------------------------------------------------------------------------

/// Complete notification configuration for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPreferences {
    /// Master switch. When off nothing is delivered.
    pub enabled: bool,
    pub devotions: DevotionPreferences,
    #[validate(nested)]
    pub events: EventPreferences,
    pub prayers: PrayerPreferences,
    pub community: CommunityPreferences,
    pub quiet_hours: QuietHours,
    pub batch_notifications: bool,
    #[validate(range(min = 1, max = 100))]
    pub max_per_day: u32,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            enabled: true,
            devotions: DevotionPreferences::default(),
            events: EventPreferences::default(),
            prayers: PrayerPreferences::default(),
            community: CommunityPreferences::default(),
            quiet_hours: QuietHours::default(),
            batch_notifications: true,
            max_per_day: DEFAULT_MAX_PER_DAY,
        }
    }
}

impl NotificationPreferences {
    /// Validate field ranges before the value is stored.
    pub fn validate_all(&self) -> Result<(), CoreError> {
        self.validate()?;
        if let Some(bad) = self
            .events
            .reminder_lead_minutes
            .iter()
            .find(|m| **m == 0 || **m > MAX_EVENT_LEAD_MINUTES)
        {
            return Err(CoreError::Validation(format!(
                "Event reminder lead time {bad} must be between 1 and {MAX_EVENT_LEAD_MINUTES} minutes"
            )));
        }
        Ok(())
    }

    /// Parse stored JSON, filling any missing field with its default.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::Validation(format!("Malformed preferences: {e}")))
    }
}
