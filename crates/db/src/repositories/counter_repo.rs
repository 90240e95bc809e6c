//! Repository for the `delivery_counters` table.

use chapel_core::policy::DailyCounter;
use sqlx::PgPool;

use crate::models::counter::DeliveryCounterRow;

/// Column list for `delivery_counters` queries.
const COLUMNS: &str = "user_key, count, last_reset_date, updated_at";

/// Persists the lazily reset daily delivery counter per user.
pub struct DeliveryCounterRepo;

impl DeliveryCounterRepo {
    /// Get the counter for a user key.
    pub async fn get(
        pool: &PgPool,
        user_key: &str,
    ) -> Result<Option<DeliveryCounterRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM delivery_counters WHERE user_key = $1");
        sqlx::query_as::<_, DeliveryCounterRow>(&query)
            .bind(user_key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or overwrite the counter for a user key.
    pub async fn upsert(
        pool: &PgPool,
        user_key: &str,
        counter: &DailyCounter,
    ) -> Result<(), sqlx::Error> {
        let count = i32::try_from(counter.count).unwrap_or(i32::MAX);
        sqlx::query(
            "INSERT INTO delivery_counters (user_key, count, last_reset_date) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (user_key) DO UPDATE SET \
                count = EXCLUDED.count, \
                last_reset_date = EXCLUDED.last_reset_date, \
                updated_at = NOW()",
        )
        .bind(user_key)
        .bind(count)
        .bind(counter.last_reset_date)
        .execute(pool)
        .await?;
        Ok(())
    }
}
