//! Notification payload model.
//!
//! [`ChurchNotification`] is a closed set of categories. Each variant
//! carries its identifying fields plus the common [`NotificationPayload`]
//! handed to the delivery transport.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Asset paths
// ---------------------------------------------------------------------------

/// Application icon shown on every notification.
pub const ICON_DEFAULT: &str = "/icons/icon-192x192.png";

/// Monochrome badge shown in the status bar.
pub const BADGE_DEFAULT: &str = "/icons/badge-72x72.png";

pub const ICON_ACTION_READ: &str = "/icons/action-read.png";
pub const ICON_ACTION_SAVE: &str = "/icons/action-save.png";
pub const ICON_ACTION_PRAY: &str = "/icons/action-pray.png";
pub const ICON_ACTION_VIEW: &str = "/icons/action-view.png";
pub const ICON_ACTION_DIRECTIONS: &str = "/icons/action-directions.png";

// ---------------------------------------------------------------------------
// Action keys
// ---------------------------------------------------------------------------

pub const ACTION_READ: &str = "read";
pub const ACTION_VIEW: &str = "view";
pub const ACTION_SAVE: &str = "save";
pub const ACTION_PRAY: &str = "pray";
pub const ACTION_DIRECTIONS: &str = "directions";

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Notification category, also used as the `type` tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Devotion,
    Prayer,
    Event,
    Community,
    Reminder,
}

impl NotificationCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Devotion => "devotion",
            Self::Prayer => "prayer",
            Self::Event => "event",
            Self::Community => "community",
            Self::Reminder => "reminder",
        }
    }
}

/// Kind of prayer request a notification announces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrayerRequestType {
    New,
    Urgent,
    Update,
    Answered,
}

impl PrayerRequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Urgent => "urgent",
            Self::Update => "update",
            Self::Answered => "answered",
        }
    }
}

/// Community sub-type, each gated by its own preference toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunityKind {
    GroupMessage,
    Announcement,
    NewMember,
}

impl CommunityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GroupMessage => "group_message",
            Self::Announcement => "announcement",
            Self::NewMember => "new_member",
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// A button shown on the notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationAction {
    /// Key reported back on click (`read`, `save`, `pray`, ...).
    pub action: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl NotificationAction {
    pub fn new(action: &str, title: impl Into<String>, icon: &str) -> Self {
        Self {
            action: action.to_string(),
            title: title.into(),
            icon: Some(icon.to_string()),
        }
    }
}

/// Deep-link routing data echoed back by the transport on click/close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub id: String,
    #[serde(rename = "type")]
    pub category: NotificationCategory,
    /// In-app path the notification opens.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<PrayerRequestType>,
}

impl NotificationData {
    pub fn new(id: impl Into<String>, category: NotificationCategory, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category,
            url: url.into(),
            location: None,
            request_type: None,
        }
    }
}

/// Fields common to every notification category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Collapse key: re-delivery with the same tag replaces instead of stacking.
    pub tag: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub require_interaction: bool,
    pub data: NotificationData,
    #[serde(default)]
    pub actions: Vec<NotificationAction>,
}

// ---------------------------------------------------------------------------
// ChurchNotification
// ---------------------------------------------------------------------------

/// A fully built notification, one variant per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChurchNotification {
    #[serde(rename_all = "camelCase")]
    Devotion {
        devotion_id: String,
        #[serde(flatten)]
        payload: NotificationPayload,
    },
    #[serde(rename_all = "camelCase")]
    Prayer {
        request_id: String,
        request_type: PrayerRequestType,
        #[serde(flatten)]
        payload: NotificationPayload,
    },
    #[serde(rename_all = "camelCase")]
    Event {
        event_id: String,
        #[serde(default)]
        location: Option<String>,
        #[serde(flatten)]
        payload: NotificationPayload,
    },
    #[serde(rename_all = "camelCase")]
    Community {
        group_id: String,
        kind: CommunityKind,
        #[serde(flatten)]
        payload: NotificationPayload,
    },
    #[serde(rename_all = "camelCase")]
    Reminder {
        reminder_id: String,
        #[serde(flatten)]
        payload: NotificationPayload,
    },
}

impl ChurchNotification {
    pub fn category(&self) -> NotificationCategory {
        match self {
            Self::Devotion { .. } => NotificationCategory::Devotion,
            Self::Prayer { .. } => NotificationCategory::Prayer,
            Self::Event { .. } => NotificationCategory::Event,
            Self::Community { .. } => NotificationCategory::Community,
            Self::Reminder { .. } => NotificationCategory::Reminder,
        }
    }

    pub fn payload(&self) -> &NotificationPayload {
        match self {
            Self::Devotion { payload, .. }
            | Self::Prayer { payload, .. }
            | Self::Event { payload, .. }
            | Self::Community { payload, .. }
            | Self::Reminder { payload, .. } => payload,
        }
    }

    /// Identifier of the source record.
    pub fn id(&self) -> &str {
        match self {
            Self::Devotion { devotion_id, .. } => devotion_id,
            Self::Prayer { request_id, .. } => request_id,
            Self::Event { event_id, .. } => event_id,
            Self::Community { group_id, .. } => group_id,
            Self::Reminder { reminder_id, .. } => reminder_id,
        }
    }

    pub fn tag(&self) -> &str {
        &self.payload().tag
    }

    /// Only urgent prayer requests bypass batching and quiet hours.
    pub fn is_urgent(&self) -> bool {
        matches!(
            self,
            Self::Prayer {
                request_type: PrayerRequestType::Urgent,
                ..
            }
        )
    }
}
