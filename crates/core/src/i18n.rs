//! Bilingual display strings for notification content.
//!
//! Pure lookup: no state, no I/O. Keys are category-scoped
//! (`devotion.title`, `prayer.urgent`, `community.group_message`, ...).
//! A missing translation falls back to English, and a key unknown to
//! English is returned verbatim, so callers always get printable text.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Language
// ---------------------------------------------------------------------------

/// Display language for notification text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Parse a language tag. Any `zh` tag (`zh`, `zh-TW`, `zh_Hant`) maps
    /// to Chinese; everything else is English.
    pub fn from_tag(tag: &str) -> Self {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "zh" => Self::Zh,
            _ => Self::En,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Zh => "zh",
        }
    }
}

impl From<String> for Language {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn english(key: &str) -> Option<&'static str> {
    let text = match key {
        "devotion.title" => "Today's Devotion",
        "devotion.read" => "Read now",
        "devotion.save" => "Save for later",
        "devotion.reminder_title" => "Time for your devotion",
        "devotion.reminder_body" => "Take a quiet moment with today's reading.",

        "prayer.new" => "New prayer request",
        "prayer.urgent" => "Urgent prayer request",
        "prayer.update" => "Prayer request update",
        "prayer.answered" => "Prayer answered",
        "prayer.pray" => "Pray now",
        "prayer.view" => "View",

        "event.reminder" => "Upcoming event",
        "event.body" => "{title} begins at {time}",
        "event.body_location" => "{title} begins at {time} at {location}",
        "event.view" => "View event",
        "event.directions" => "Directions",

        "community.group_message" => "New message in {group}",
        "community.announcement" => "Church announcement",
        "community.new_member" => "A new member joined {group}",
        "community.view" => "Open",

        "reminder.title" => "Reminder",
        "reminder.view" => "Open",
        _ => return None,
    };
    Some(text)
}

fn chinese(key: &str) -> Option<&'static str> {
    let text = match key {
        "devotion.title" => "今日靈修",
        "devotion.read" => "立即閱讀",
        "devotion.save" => "稍後閱讀",
        "devotion.reminder_title" => "靈修時間到了",
        "devotion.reminder_body" => "花點時間安靜閱讀今天的經文。",

        "prayer.new" => "新的代禱事項",
        "prayer.urgent" => "緊急代禱事項",
        "prayer.update" => "代禱事項更新",
        "prayer.answered" => "禱告蒙應允",
        "prayer.pray" => "立即禱告",
        "prayer.view" => "查看",

        "event.reminder" => "活動提醒",
        "event.body" => "{title} 將於 {time} 開始",
        "event.body_location" => "{title} 將於 {time} 在 {location} 開始",
        "event.view" => "查看活動",
        "event.directions" => "路線",

        "community.group_message" => "{group} 有新訊息",
        "community.announcement" => "教會公告",
        "community.new_member" => "{group} 有新成員加入",
        "community.view" => "開啟",

        "reminder.title" => "提醒",
        "reminder.view" => "開啟",
        _ => return None,
    };
    Some(text)
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve `key` for `language`, falling back to English, then to the key.
pub fn resolve(key: &str, language: Language) -> String {
    let localized = match language {
        Language::En => english(key),
        Language::Zh => chinese(key).or_else(|| english(key)),
    };
    match localized {
        Some(text) => text.to_string(),
        None if key.is_empty() => "?".to_string(),
        None => key.to_string(),
    }
}

/// Resolve `key` and substitute `{name}` placeholders from `args`.
///
/// Placeholders without a matching argument are left in place.
pub fn resolve_with(key: &str, language: Language, args: &[(&str, &str)]) -> String {
    let mut text = resolve(key, language);
    for (name, value) in args {
        text = text.replace(&format!("{{{name}}}"), value);
    }
    text
}
