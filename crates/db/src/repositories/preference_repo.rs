//! Repository for the `notification_preferences` table.

use sqlx::PgPool;

use crate::models::preference::StoredPreferences;

/// Column list for `notification_preferences` queries.
const COLUMNS: &str = "user_key, preferences, created_at, updated_at";

/// Reads and replaces the server-side copy of a user's preferences.
pub struct PreferenceRepo;

impl PreferenceRepo {
    /// Get the stored preferences for a user key.
    pub async fn get(
        pool: &PgPool,
        user_key: &str,
    ) -> Result<Option<StoredPreferences>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notification_preferences WHERE user_key = $1");
        sqlx::query_as::<_, StoredPreferences>(&query)
            .bind(user_key)
            .fetch_optional(pool)
            .await
    }

    /// Replace the stored preferences for a user key.
    ///
    /// The whole JSON document is overwritten; there is no field merge.
    pub async fn replace(
        pool: &PgPool,
        user_key: &str,
        preferences: &serde_json::Value,
    ) -> Result<StoredPreferences, sqlx::Error> {
        let query = format!(
            "INSERT INTO notification_preferences (user_key, preferences) \
             VALUES ($1, $2) \
             ON CONFLICT (user_key) DO UPDATE SET \
                preferences = EXCLUDED.preferences, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StoredPreferences>(&query)
            .bind(user_key)
            .bind(preferences)
            .fetch_one(pool)
            .await
    }
}
