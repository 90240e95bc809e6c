//! Notification builders, one per category.
//!
//! Each builder is a pure transformation from a source record and the
//! user's preferences to a [`ChurchNotification`]: it picks the display
//! language, truncates free text to platform body limits, stamps a
//! collapse tag and the build time, and attaches the category's actions.

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::i18n::{self, Language};
use crate::notification::{
    ChurchNotification, CommunityKind, NotificationAction, NotificationCategory, NotificationData,
    NotificationPayload, PrayerRequestType, ACTION_DIRECTIONS, ACTION_PRAY, ACTION_READ,
    ACTION_SAVE, ACTION_VIEW, BADGE_DEFAULT, ICON_ACTION_DIRECTIONS, ICON_ACTION_PRAY,
    ICON_ACTION_READ, ICON_ACTION_SAVE, ICON_ACTION_VIEW, ICON_DEFAULT,
};
use crate::preferences::NotificationPreferences;
use crate::types::Timestamp;

/// Maximum characters of a prayer description shown in the body.
pub const PRAYER_BODY_MAX_CHARS: usize = 100;

/// Maximum characters of a community message shown in the body.
pub const COMMUNITY_BODY_MAX_CHARS: usize = 120;

/// Appended to truncated bodies.
pub const ELLIPSIS: &str = "…";

/// Schedule and reminder id of the recurring daily devotion.
pub const DAILY_DEVOTION_ID: &str = "daily-devotion";

// ---------------------------------------------------------------------------
// Source records
// ---------------------------------------------------------------------------

/// A devotion as stored by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevotionRecord {
    pub id: String,
    pub title: String,
    pub scripture: Option<String>,
    pub image_url: Option<String>,
}

/// A prayer request as stored by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerRequestRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub request_type: PrayerRequestType,
}

/// A calendar event as stored by the content layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    pub starts_at: Timestamp,
    pub location: Option<String>,
}

/// A small-group message, announcement, or membership change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMessageRecord {
    pub group_id: String,
    pub group_name: String,
    pub kind: CommunityKind,
    pub sender_name: Option<String>,
    pub message: String,
}

/// A free-form reminder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    /// In-app path opened on click.
    pub url: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Cut `text` to at most `max_chars` characters, appending [`ELLIPSIS`]
/// when anything was removed. Counts characters, not bytes.
pub fn truncate_body(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}{ELLIPSIS}", cut.trim_end())
}

fn payload(
    title: String,
    body: String,
    tag: String,
    data: NotificationData,
    actions: Vec<NotificationAction>,
    now: Timestamp,
) -> NotificationPayload {
    NotificationPayload {
        title,
        body,
        icon: ICON_DEFAULT.to_string(),
        badge: BADGE_DEFAULT.to_string(),
        image: None,
        tag,
        timestamp: now,
        require_interaction: false,
        data,
        actions,
    }
}

/// In-app paths only; anything else routes to the home screen.
fn in_app_path(url: &str) -> String {
    if url.starts_with('/') && !url.starts_with("//") {
        url.to_string()
    } else {
        "/".to_string()
    }
}

// ---------------------------------------------------------------------------
// NotificationFactory
// ---------------------------------------------------------------------------

/// Builds notifications for the deployment's civil time zone.
#[derive(Debug, Clone, Copy)]
pub struct NotificationFactory {
    tz: FixedOffset,
}

impl NotificationFactory {
    pub fn new(tz: FixedOffset) -> Self {
        Self { tz }
    }

    pub fn create_devotion_notification(
        &self,
        record: &DevotionRecord,
        prefs: &NotificationPreferences,
        now: Timestamp,
    ) -> ChurchNotification {
        let lang = prefs.devotions.language;
        let body = match &record.scripture {
            Some(scripture) if !scripture.trim().is_empty() => {
                format!("{} ({})", record.title.trim(), scripture.trim())
            }
            _ => record.title.trim().to_string(),
        };
        let actions = vec![
            NotificationAction::new(
                ACTION_READ,
                i18n::resolve("devotion.read", lang),
                ICON_ACTION_READ,
            ),
            NotificationAction::new(
                ACTION_SAVE,
                i18n::resolve("devotion.save", lang),
                ICON_ACTION_SAVE,
            ),
        ];
        let data = NotificationData::new(
            &record.id,
            NotificationCategory::Devotion,
            format!("/devotions/{}", record.id),
        );
        let mut payload = payload(
            i18n::resolve("devotion.title", lang),
            body,
            format!("devotion-{}", record.id),
            data,
            actions,
            now,
        );
        payload.image = record.image_url.clone();

        ChurchNotification::Devotion {
            devotion_id: record.id.clone(),
            payload,
        }
    }

    pub fn create_prayer_notification(
        &self,
        record: &PrayerRequestRecord,
        prefs: &NotificationPreferences,
        now: Timestamp,
    ) -> ChurchNotification {
        let lang = prefs.prayers.language;
        let title_key = format!("prayer.{}", record.request_type.as_str());
        let text = if record.description.trim().is_empty() {
            &record.title
        } else {
            &record.description
        };
        let actions = vec![
            NotificationAction::new(ACTION_PRAY, i18n::resolve("prayer.pray", lang), ICON_ACTION_PRAY),
            NotificationAction::new(ACTION_VIEW, i18n::resolve("prayer.view", lang), ICON_ACTION_VIEW),
        ];
        let mut data = NotificationData::new(
            &record.id,
            NotificationCategory::Prayer,
            format!("/prayers/{}", record.id),
        );
        data.request_type = Some(record.request_type);

        let mut payload = payload(
            i18n::resolve(&title_key, lang),
            truncate_body(text, PRAYER_BODY_MAX_CHARS),
            format!("prayer-{}", record.request_type.as_str()),
            data,
            actions,
            now,
        );
        payload.require_interaction = record.request_type == PrayerRequestType::Urgent;

        ChurchNotification::Prayer {
            request_id: record.id.clone(),
            request_type: record.request_type,
            payload,
        }
    }

    pub fn create_event_notification(
        &self,
        record: &EventRecord,
        prefs: &NotificationPreferences,
        now: Timestamp,
    ) -> ChurchNotification {
        let lang = prefs.events.language;
        let time = record.starts_at.with_timezone(&self.tz).format("%H:%M").to_string();
        let location = record
            .location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        let body = match location {
            Some(loc) => i18n::resolve_with(
                "event.body_location",
                lang,
                &[("title", record.title.trim()), ("time", &time), ("location", loc)],
            ),
            None => i18n::resolve_with(
                "event.body",
                lang,
                &[("title", record.title.trim()), ("time", &time)],
            ),
        };

        let mut actions = vec![NotificationAction::new(
            ACTION_VIEW,
            i18n::resolve("event.view", lang),
            ICON_ACTION_VIEW,
        )];
        if location.is_some() {
            actions.push(NotificationAction::new(
                ACTION_DIRECTIONS,
                i18n::resolve("event.directions", lang),
                ICON_ACTION_DIRECTIONS,
            ));
        }

        let mut data = NotificationData::new(
            &record.id,
            NotificationCategory::Event,
            format!("/events/{}", record.id),
        );
        data.location = location.map(str::to_string);

        ChurchNotification::Event {
            event_id: record.id.clone(),
            location: location.map(str::to_string),
            payload: payload(
                i18n::resolve("event.reminder", lang),
                body,
                format!("event-{}", record.id),
                data,
                actions,
                now,
            ),
        }
    }

    pub fn create_community_notification(
        &self,
        record: &GroupMessageRecord,
        prefs: &NotificationPreferences,
        now: Timestamp,
    ) -> ChurchNotification {
        let lang = prefs.community.language;
        let group = record.group_name.trim();
        let title = match record.kind {
            CommunityKind::GroupMessage => {
                i18n::resolve_with("community.group_message", lang, &[("group", group)])
            }
            CommunityKind::Announcement => i18n::resolve("community.announcement", lang),
            CommunityKind::NewMember => {
                i18n::resolve_with("community.new_member", lang, &[("group", group)])
            }
        };
        let text = match record.sender_name.as_deref().map(str::trim) {
            Some(sender) if !sender.is_empty() => format!("{sender}: {}", record.message.trim()),
            _ => record.message.trim().to_string(),
        };
        let url = match record.kind {
            CommunityKind::Announcement => "/announcements".to_string(),
            _ => format!("/groups/{}", record.group_id),
        };
        let actions = vec![NotificationAction::new(
            ACTION_VIEW,
            i18n::resolve("community.view", lang),
            ICON_ACTION_VIEW,
        )];
        let data = NotificationData::new(&record.group_id, NotificationCategory::Community, url);

        ChurchNotification::Community {
            group_id: record.group_id.clone(),
            kind: record.kind,
            payload: payload(
                title,
                truncate_body(&text, COMMUNITY_BODY_MAX_CHARS),
                format!("community-{}-{}", record.kind.as_str(), record.group_id),
                data,
                actions,
                now,
            ),
        }
    }

    pub fn create_reminder_notification(
        &self,
        record: &ReminderRecord,
        prefs: &NotificationPreferences,
        now: Timestamp,
    ) -> ChurchNotification {
        let lang = prefs.devotions.language;
        let title = match record.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => i18n::resolve("reminder.title", lang),
        };
        let actions = vec![NotificationAction::new(
            ACTION_VIEW,
            i18n::resolve("reminder.view", lang),
            ICON_ACTION_VIEW,
        )];
        let data = NotificationData::new(
            &record.id,
            NotificationCategory::Reminder,
            in_app_path(&record.url),
        );

        ChurchNotification::Reminder {
            reminder_id: record.id.clone(),
            payload: payload(
                title,
                record.body.trim().to_string(),
                format!("reminder-{}", record.id),
                data,
                actions,
                now,
            ),
        }
    }

    /// The reminder delivered by the recurring daily-devotion schedule.
    pub fn daily_devotion_reminder(
        &self,
        language: Language,
        now: Timestamp,
    ) -> ChurchNotification {
        let record = ReminderRecord {
            id: DAILY_DEVOTION_ID.to_string(),
            title: Some(i18n::resolve("devotion.reminder_title", language)),
            body: i18n::resolve("devotion.reminder_body", language),
            url: "/devotions/today".to_string(),
        };
        let mut prefs = NotificationPreferences::default();
        prefs.devotions.language = language;
        self.create_reminder_notification(&record, &prefs, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn factory() -> NotificationFactory {
        NotificationFactory::new(FixedOffset::east_opt(8 * 3600).unwrap())
    }

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 10, 1, 0, 0).unwrap()
    }

    fn prayer(request_type: PrayerRequestType, description: &str) -> PrayerRequestRecord {
        PrayerRequestRecord {
            id: "p-7".into(),
            title: "For healing".into(),
            description: description.into(),
            request_type,
        }
    }

    // -----------------------------------------------------------------------
    // Truncation
    // -----------------------------------------------------------------------

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate_body("hello", 10), "hello");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let text = "禱".repeat(130);
        let out = truncate_body(&text, COMMUNITY_BODY_MAX_CHARS);
        assert_eq!(out.chars().count(), COMMUNITY_BODY_MAX_CHARS + 1);
        assert!(out.ends_with(ELLIPSIS));
    }

    #[test]
    fn long_prayer_description_is_cut_to_limit() {
        let description = "a".repeat(150);
        let n = factory().create_prayer_notification(
            &prayer(PrayerRequestType::New, &description),
            &NotificationPreferences::default(),
            now(),
        );
        let body = &n.payload().body;
        let without_marker = body.strip_suffix(ELLIPSIS).expect("ellipsis appended");
        assert!(without_marker.chars().count() <= PRAYER_BODY_MAX_CHARS);
    }

    // -----------------------------------------------------------------------
    // Builders
    // -----------------------------------------------------------------------

    #[test]
    fn urgent_prayer_requires_interaction_and_tags_by_type() {
        let n = factory().create_prayer_notification(
            &prayer(PrayerRequestType::Urgent, "Surgery tonight"),
            &NotificationPreferences::default(),
            now(),
        );
        let p = n.payload();
        assert!(n.is_urgent());
        assert!(p.require_interaction);
        assert_eq!(p.tag, "prayer-urgent");
        assert_eq!(p.title, "Urgent prayer request");
        assert_eq!(p.data.url, "/prayers/p-7");
        assert_eq!(p.timestamp, now());
        let keys: Vec<_> = p.actions.iter().map(|a| a.action.as_str()).collect();
        assert_eq!(keys, ["pray", "view"]);
    }

    #[test]
    fn empty_description_falls_back_to_title() {
        let n = factory().create_prayer_notification(
            &prayer(PrayerRequestType::Answered, "  "),
            &NotificationPreferences::default(),
            now(),
        );
        assert_eq!(n.payload().body, "For healing");
    }

    #[test]
    fn devotion_uses_preferred_language() {
        let mut prefs = NotificationPreferences::default();
        prefs.devotions.language = Language::Zh;
        let record = DevotionRecord {
            id: "d-1".into(),
            title: "Be still".into(),
            scripture: Some("Psalm 46:10".into()),
            image_url: None,
        };
        let n = factory().create_devotion_notification(&record, &prefs, now());
        let p = n.payload();
        assert_eq!(p.title, "今日靈修");
        assert_eq!(p.body, "Be still (Psalm 46:10)");
        assert_eq!(p.tag, "devotion-d-1");
        assert_eq!(p.data.url, "/devotions/d-1");
        assert_eq!(p.actions[0].action, "read");
        assert_eq!(p.actions[1].action, "save");
    }

    #[test]
    fn event_formats_local_start_time_and_offers_directions() {
        let record = EventRecord {
            id: "e-3".into(),
            title: "Worship night".into(),
            starts_at: Utc.with_ymd_and_hms(2026, 5, 10, 11, 30, 0).unwrap(),
            location: Some("Main Hall".into()),
        };
        let n = factory().create_event_notification(
            &record,
            &NotificationPreferences::default(),
            now(),
        );
        let p = n.payload();
        assert_eq!(p.body, "Worship night begins at 19:30 at Main Hall");
        assert_eq!(p.tag, "event-e-3");
        assert_eq!(p.data.location.as_deref(), Some("Main Hall"));
        assert!(p.actions.iter().any(|a| a.action == "directions"));
    }

    #[test]
    fn event_without_location_has_no_directions() {
        let record = EventRecord {
            id: "e-4".into(),
            title: "Online study".into(),
            starts_at: now(),
            location: Some("   ".into()),
        };
        let n = factory().create_event_notification(
            &record,
            &NotificationPreferences::default(),
            now(),
        );
        assert!(n.payload().actions.iter().all(|a| a.action != "directions"));
        assert_eq!(n.payload().data.location, None);
    }

    #[test]
    fn community_message_is_prefixed_and_truncated() {
        let record = GroupMessageRecord {
            group_id: "g-9".into(),
            group_name: "Young Adults".into(),
            kind: CommunityKind::GroupMessage,
            sender_name: Some("Grace".into()),
            message: "x".repeat(200),
        };
        let n = factory().create_community_notification(
            &record,
            &NotificationPreferences::default(),
            now(),
        );
        let p = n.payload();
        assert_eq!(p.title, "New message in Young Adults");
        assert!(p.body.starts_with("Grace: "));
        assert_eq!(p.body.chars().count(), COMMUNITY_BODY_MAX_CHARS + 1);
        assert_eq!(p.tag, "community-group_message-g-9");
        assert_eq!(p.data.url, "/groups/g-9");
    }

    #[test]
    fn reminder_rejects_external_urls() {
        let record = ReminderRecord {
            id: "r-1".into(),
            title: None,
            body: "Bring a friend".into(),
            url: "https://elsewhere.example".into(),
        };
        let n = factory().create_reminder_notification(
            &record,
            &NotificationPreferences::default(),
            now(),
        );
        assert_eq!(n.payload().data.url, "/");
        assert_eq!(n.payload().title, "Reminder");
    }

    #[test]
    fn daily_devotion_reminder_is_localized() {
        let n = factory().daily_devotion_reminder(Language::Zh, now());
        assert_eq!(n.id(), DAILY_DEVOTION_ID);
        assert_eq!(n.payload().title, "靈修時間到了");
        assert_eq!(n.payload().data.url, "/devotions/today");
    }
}
