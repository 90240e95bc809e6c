//! Delivery policy: the pure half of the delivery gate.
//!
//! Decides from preferences alone whether a notification may go out and by
//! which route. The stateful gate in the events crate owns the batch queue,
//! the flush timer, and the [`DailyCounter`].

use chrono::{FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::notification::{ChurchNotification, CommunityKind, PrayerRequestType};
use crate::preferences::NotificationPreferences;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Why a notification was not delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suppression {
    /// Master switch is off.
    Disabled,
    /// Category or sub-category is off, or filtered by `urgent_only`.
    Preference,
    /// Non-urgent notification inside the quiet-hours window.
    QuietHours,
    /// The user's `max_per_day` has been reached today.
    DailyCap,
}

impl Suppression {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Preference => "preference",
            Self::QuietHours => "quiet_hours",
            Self::DailyCap => "daily_cap",
        }
    }
}

/// How an admitted notification travels to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Flush any pending batch, then send this one right away.
    Urgent,
    /// Append to the batch queue.
    Batch,
    /// Send right away; batching is off.
    Immediate,
}

/// Whether the category-level preferences admit `notification`.
pub fn category_allowed(prefs: &NotificationPreferences, notification: &ChurchNotification) -> bool {
    match notification {
        ChurchNotification::Devotion { .. } => prefs.devotions.enabled,
        ChurchNotification::Prayer { request_type, .. } => {
            prefs.prayers.enabled
                && (!prefs.prayers.urgent_only || *request_type == PrayerRequestType::Urgent)
        }
        ChurchNotification::Event { .. } => prefs.events.enabled,
        ChurchNotification::Community { kind, .. } => {
            let community = &prefs.community;
            community.enabled
                && match kind {
                    CommunityKind::GroupMessage => community.group_messages,
                    CommunityKind::Announcement => community.announcements,
                    CommunityKind::NewMember => community.new_members,
                }
        }
        ChurchNotification::Reminder { .. } => true,
    }
}

/// Evaluate every preference-driven rule except the daily cap.
pub fn evaluate(
    prefs: &NotificationPreferences,
    notification: &ChurchNotification,
    now: Timestamp,
    tz: FixedOffset,
) -> Result<Route, Suppression> {
    if !prefs.enabled {
        return Err(Suppression::Disabled);
    }
    if !category_allowed(prefs, notification) {
        return Err(Suppression::Preference);
    }
    if notification.is_urgent() {
        return Ok(Route::Urgent);
    }
    if calendar::is_in_quiet_hours(now, &prefs.quiet_hours, tz) {
        return Err(Suppression::QuietHours);
    }
    if prefs.batch_notifications {
        Ok(Route::Batch)
    } else {
        Ok(Route::Immediate)
    }
}

// ---------------------------------------------------------------------------
// DailyCounter
// ---------------------------------------------------------------------------

/// Count of notifications delivered on one civil date.
///
/// Reset lazily: the first attempt observed on a new date zeroes the count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCounter {
    pub count: u32,
    pub last_reset_date: Option<NaiveDate>,
}

impl DailyCounter {
    /// Zero the count if `today` differs from the last reset date.
    ///
    /// Returns `true` when a reset happened.
    pub fn reset_if_new_day(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == Some(today) {
            return false;
        }
        self.count = 0;
        self.last_reset_date = Some(today);
        true
    }

    /// Record one delivery if under `max_per_day`.
    ///
    /// Returns `false`, leaving the count unchanged, when the cap is reached.
    pub fn try_consume(&mut self, today: NaiveDate, max_per_day: u32) -> bool {
        self.reset_if_new_day(today);
        if self.count >= max_per_day {
            return false;
        }
        self.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{GroupMessageRecord, NotificationFactory, PrayerRequestRecord, ReminderRecord};
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(8 * 3600).unwrap()
    }

    /// Noon local time, outside the default quiet hours.
    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 1, 4, 0, 0).unwrap()
    }

    /// 23:30 local time, inside the default quiet hours.
    fn late_night() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 1, 15, 30, 0).unwrap()
    }

    fn prayer(request_type: PrayerRequestType) -> ChurchNotification {
        NotificationFactory::new(tz()).create_prayer_notification(
            &PrayerRequestRecord {
                id: "p".into(),
                title: "t".into(),
                description: "d".into(),
                request_type,
            },
            &NotificationPreferences::default(),
            noon(),
        )
    }

    fn community(kind: CommunityKind) -> ChurchNotification {
        NotificationFactory::new(tz()).create_community_notification(
            &GroupMessageRecord {
                group_id: "g".into(),
                group_name: "Group".into(),
                kind,
                sender_name: None,
                message: "hi".into(),
            },
            &NotificationPreferences::default(),
            noon(),
        )
    }

    fn reminder() -> ChurchNotification {
        NotificationFactory::new(tz()).create_reminder_notification(
            &ReminderRecord {
                id: "r".into(),
                title: None,
                body: "b".into(),
                url: "/".into(),
            },
            &NotificationPreferences::default(),
            noon(),
        )
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, d).unwrap()
    }

    // -----------------------------------------------------------------------
    // evaluate
    // -----------------------------------------------------------------------

    #[test]
    fn master_switch_wins() {
        let prefs = NotificationPreferences {
            enabled: false,
            ..Default::default()
        };
        assert_matches!(
            evaluate(&prefs, &prayer(PrayerRequestType::Urgent), noon(), tz()),
            Err(Suppression::Disabled)
        );
    }

    #[test]
    fn urgent_only_admits_urgent_and_blocks_new() {
        let mut prefs = NotificationPreferences::default();
        prefs.prayers.urgent_only = true;
        assert_matches!(
            evaluate(&prefs, &prayer(PrayerRequestType::Urgent), noon(), tz()),
            Ok(Route::Urgent)
        );
        assert_matches!(
            evaluate(&prefs, &prayer(PrayerRequestType::New), noon(), tz()),
            Err(Suppression::Preference)
        );
    }

    #[test]
    fn community_sub_toggles_apply() {
        let mut prefs = NotificationPreferences::default();
        prefs.community.new_members = false;
        assert!(!category_allowed(&prefs, &community(CommunityKind::NewMember)));
        assert!(category_allowed(&prefs, &community(CommunityKind::GroupMessage)));
        prefs.community.enabled = false;
        assert!(!category_allowed(&prefs, &community(CommunityKind::GroupMessage)));
    }

    #[test]
    fn reminders_only_follow_master_switch() {
        let mut prefs = NotificationPreferences::default();
        prefs.devotions.enabled = false;
        prefs.events.enabled = false;
        assert!(category_allowed(&prefs, &reminder()));
    }

    #[test]
    fn quiet_hours_hold_back_non_urgent_only() {
        let prefs = NotificationPreferences::default();
        assert_matches!(
            evaluate(&prefs, &prayer(PrayerRequestType::New), late_night(), tz()),
            Err(Suppression::QuietHours)
        );
        assert_matches!(
            evaluate(&prefs, &prayer(PrayerRequestType::Urgent), late_night(), tz()),
            Ok(Route::Urgent)
        );
    }

    #[test]
    fn batching_toggle_selects_route() {
        let mut prefs = NotificationPreferences::default();
        assert_matches!(evaluate(&prefs, &reminder(), noon(), tz()), Ok(Route::Batch));
        prefs.batch_notifications = false;
        assert_matches!(evaluate(&prefs, &reminder(), noon(), tz()), Ok(Route::Immediate));
    }

    // -----------------------------------------------------------------------
    // DailyCounter
    // -----------------------------------------------------------------------

    #[test]
    fn cap_blocks_third_and_resets_next_day() {
        let mut counter = DailyCounter::default();
        assert!(counter.try_consume(date(1), 2));
        assert!(counter.try_consume(date(1), 2));
        assert!(!counter.try_consume(date(1), 2));
        assert_eq!(counter.count, 2);

        assert!(counter.try_consume(date(2), 2));
        assert_eq!(counter.count, 1);
        assert_eq!(counter.last_reset_date, Some(date(2)));
    }

    #[test]
    fn reset_only_on_new_date() {
        let mut counter = DailyCounter {
            count: 5,
            last_reset_date: Some(date(1)),
        };
        assert!(!counter.reset_if_new_day(date(1)));
        assert_eq!(counter.count, 5);
        assert!(counter.reset_if_new_day(date(3)));
        assert_eq!(counter.count, 0);
    }
}
