use std::path::PathBuf;
use std::time::Duration;

use chapel_core::types::user_key;
use chrono::{FixedOffset, Offset, Utc};

use crate::error::NotifyError;
use crate::gate::DEFAULT_BATCH_WINDOW;

/// Default civil offset: UTC+08:00.
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 480;

/// The default civil offset as a [`FixedOffset`].
pub fn default_civil_offset() -> FixedOffset {
    FixedOffset::east_opt(DEFAULT_UTC_OFFSET_MINUTES * 60).unwrap_or_else(|| Utc.fix())
}

/// Notification runtime configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct NotifyConfig {
    /// Postgres URL for the server preference mirror and delivery counters.
    /// Without it, preferences live only in the local cache.
    pub database_url: Option<String>,
    /// Directory holding the per-user preference JSON files.
    pub preferences_dir: PathBuf,
    /// Civil offset used for quiet hours, schedules, and the daily cap.
    pub civil_offset: FixedOffset,
    /// How long non-urgent notifications wait before a batch flush.
    pub batch_window: Duration,
    /// Upstream endpoint for engagement reports. Logged locally when unset.
    pub engagement_endpoint: Option<String>,
    /// Whether the delivery surface is available.
    pub push_enabled: bool,
    /// User key the worker initializes schedules for.
    pub default_user: String,
}

impl NotifyConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                    | Default                |
    /// |----------------------------|------------------------|
    /// | `DATABASE_URL`             | unset                  |
    /// | `PREFERENCES_DIR`          | `./data/preferences`   |
    /// | `CIVIL_UTC_OFFSET_MINUTES` | `480`                  |
    /// | `BATCH_WINDOW_SECS`        | `120`                  |
    /// | `ENGAGEMENT_ENDPOINT`      | unset                  |
    /// | `PUSH_ENABLED`             | `true`                 |
    /// | `DEFAULT_USER`             | `anonymous`            |
    pub fn from_env() -> Result<Self, NotifyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, NotifyError> {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let offset_minutes: i32 = match non_empty("CIVIL_UTC_OFFSET_MINUTES") {
            Some(raw) => raw.parse().map_err(|_| {
                NotifyError::Config("CIVIL_UTC_OFFSET_MINUTES must be a whole number of minutes".into())
            })?,
            None => DEFAULT_UTC_OFFSET_MINUTES,
        };
        let civil_offset = offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                NotifyError::Config(format!(
                    "CIVIL_UTC_OFFSET_MINUTES {offset_minutes} is out of range"
                ))
            })?;

        let batch_window = match non_empty("BATCH_WINDOW_SECS") {
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|_| NotifyError::Config("BATCH_WINDOW_SECS must be a valid u64".into()))?,
            ),
            None => DEFAULT_BATCH_WINDOW,
        };

        let push_enabled = match non_empty("PUSH_ENABLED") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| NotifyError::Config("PUSH_ENABLED must be true or false".into()))?,
            None => true,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            preferences_dir: non_empty("PREFERENCES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/preferences")),
            civil_offset,
            batch_window,
            engagement_endpoint: non_empty("ENGAGEMENT_ENDPOINT"),
            push_enabled,
            default_user: user_key(non_empty("DEFAULT_USER").as_deref()),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<NotifyConfig, NotifyError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        NotifyConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let config = load(&[]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.preferences_dir, PathBuf::from("./data/preferences"));
        assert_eq!(config.civil_offset.local_minus_utc(), 8 * 3600);
        assert_eq!(config.batch_window, Duration::from_secs(120));
        assert!(config.push_enabled);
        assert_eq!(config.default_user, "anonymous");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/chapel"),
            ("CIVIL_UTC_OFFSET_MINUTES", "-300"),
            ("BATCH_WINDOW_SECS", "5"),
            ("PUSH_ENABLED", "off"),
            ("DEFAULT_USER", "user-1"),
        ])
        .unwrap();
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/chapel"));
        assert_eq!(config.civil_offset.local_minus_utc(), -5 * 3600);
        assert_eq!(config.batch_window, Duration::from_secs(5));
        assert!(!config.push_enabled);
        assert_eq!(config.default_user, "user-1");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = load(&[("DATABASE_URL", "  "), ("BATCH_WINDOW_SECS", "")]).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.batch_window, DEFAULT_BATCH_WINDOW);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert_matches!(load(&[("BATCH_WINDOW_SECS", "soon")]), Err(NotifyError::Config(_)));
        assert_matches!(
            load(&[("CIVIL_UTC_OFFSET_MINUTES", "100000")]),
            Err(NotifyError::Config(_))
        );
        assert_matches!(load(&[("PUSH_ENABLED", "maybe")]), Err(NotifyError::Config(_)));
    }
}
