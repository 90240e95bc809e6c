//! Click/close events and the in-app effects they map to.
//!
//! Pure mapping. Building external map links and reporting live in the
//! events crate.

use serde::{Deserialize, Serialize};

use crate::notification::{
    NotificationCategory, NotificationData, ACTION_DIRECTIONS, ACTION_PRAY, ACTION_SAVE,
};
use crate::types::Timestamp;

/// Action reported for close events.
pub const ACTION_CLOSE: &str = "close";

/// Action reported for clicks on the notification body.
pub const ACTION_DEFAULT: &str = "default";

// ---------------------------------------------------------------------------
// Inbound events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportEventKind {
    Click,
    Close,
}

/// A click or close signal from the delivery surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportEvent {
    pub kind: TransportEventKind,
    /// Action button key, absent for body clicks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    pub data: NotificationData,
}

// ---------------------------------------------------------------------------
// Click intents
// ---------------------------------------------------------------------------

/// What a click asks the app to do, before any side effect runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickIntent {
    /// Open an in-app path.
    Navigate(String),
    /// Save the item for later.
    Save,
    /// Open the prayer-mode view for a prayer request.
    PrayerMode(String),
    /// Open an external map search for a location.
    Directions(String),
}

/// Deep link into prayer mode for request `id`.
pub fn prayer_mode_path(id: &str) -> String {
    format!("/prayers/{id}?mode=pray")
}

/// Map a click to its intent. Missing or unknown action keys navigate to
/// `data.url`, as does `directions` without a location.
pub fn click_intent(action: Option<&str>, data: &NotificationData) -> ClickIntent {
    match action {
        Some(ACTION_SAVE) => ClickIntent::Save,
        Some(ACTION_PRAY) => ClickIntent::PrayerMode(prayer_mode_path(&data.id)),
        Some(ACTION_DIRECTIONS) => match data.location.as_deref().map(str::trim) {
            Some(location) if !location.is_empty() => {
                ClickIntent::Directions(location.to_string())
            }
            _ => ClickIntent::Navigate(data.url.clone()),
        },
        // read, view, and anything unrecognized
        _ => ClickIntent::Navigate(data.url.clone()),
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An entry in the user's saved-for-later list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    pub url: String,
    pub saved_at: Timestamp,
}

/// Upstream engagement record, sent for every click and close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementReport {
    pub action: String,
    pub notification_id: String,
    pub notification_type: NotificationCategory,
    pub timestamp: Timestamp,
}

impl EngagementReport {
    pub fn from_event(event: &TransportEvent, timestamp: Timestamp) -> Self {
        let action = match event.kind {
            TransportEventKind::Close => ACTION_CLOSE.to_string(),
            TransportEventKind::Click => event
                .action
                .clone()
                .filter(|a| !a.is_empty())
                .unwrap_or_else(|| ACTION_DEFAULT.to_string()),
        };
        Self {
            action,
            notification_id: event.data.id.clone(),
            notification_type: event.data.category,
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event_data() -> NotificationData {
        let mut data = NotificationData::new("e-1", NotificationCategory::Event, "/events/e-1");
        data.location = Some("Main Hall".into());
        data
    }

    #[test]
    fn read_and_view_navigate() {
        let data = event_data();
        assert_eq!(
            click_intent(Some("read"), &data),
            ClickIntent::Navigate("/events/e-1".into())
        );
        assert_eq!(
            click_intent(Some("view"), &data),
            ClickIntent::Navigate("/events/e-1".into())
        );
    }

    #[test]
    fn missing_or_unknown_action_navigates() {
        let data = event_data();
        assert_eq!(click_intent(None, &data), ClickIntent::Navigate("/events/e-1".into()));
        assert_eq!(
            click_intent(Some("bogus"), &data),
            ClickIntent::Navigate("/events/e-1".into())
        );
    }

    #[test]
    fn pray_opens_prayer_mode() {
        let data = NotificationData::new("p-2", NotificationCategory::Prayer, "/prayers/p-2");
        assert_eq!(
            click_intent(Some("pray"), &data),
            ClickIntent::PrayerMode("/prayers/p-2?mode=pray".into())
        );
    }

    #[test]
    fn directions_needs_location() {
        assert_eq!(
            click_intent(Some("directions"), &event_data()),
            ClickIntent::Directions("Main Hall".into())
        );
        let mut data = event_data();
        data.location = None;
        assert_eq!(
            click_intent(Some("directions"), &data),
            ClickIntent::Navigate("/events/e-1".into())
        );
    }

    #[test]
    fn report_action_names() {
        let now = chrono::Utc::now();
        let mut event = TransportEvent {
            kind: TransportEventKind::Click,
            action: None,
            data: event_data(),
        };
        assert_eq!(EngagementReport::from_event(&event, now).action, "default");

        event.action = Some("save".into());
        let report = EngagementReport::from_event(&event, now);
        assert_eq!(report.action, "save");
        assert_eq!(report.notification_id, "e-1");
        assert_eq!(report.notification_type, NotificationCategory::Event);

        event.kind = TransportEventKind::Close;
        assert_eq!(EngagementReport::from_event(&event, now).action, "close");
    }

    #[test]
    fn report_wire_format() {
        let report = EngagementReport {
            action: "pray".into(),
            notification_id: "p-1".into(),
            notification_type: NotificationCategory::Prayer,
            timestamp: chrono::Utc::now(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["notificationId"], "p-1");
        assert_eq!(json["notificationType"], "prayer");
        assert!(json["timestamp"].is_string());
    }
}
