//! Stored preference models.

use chapel_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notification_preferences` table.
///
/// `preferences` holds the camelCase JSON form of
/// [`NotificationPreferences`](chapel_core::preferences::NotificationPreferences).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredPreferences {
    pub user_key: String,
    pub preferences: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
