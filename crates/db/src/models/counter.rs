//! Daily delivery counter model.

use chapel_core::policy::DailyCounter;
use chapel_core::types::Timestamp;
use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `delivery_counters` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DeliveryCounterRow {
    pub user_key: String,
    pub count: i32,
    pub last_reset_date: Option<NaiveDate>,
    pub updated_at: Timestamp,
}

impl From<DeliveryCounterRow> for DailyCounter {
    fn from(row: DeliveryCounterRow) -> Self {
        DailyCounter {
            count: u32::try_from(row.count).unwrap_or(0),
            last_reset_date: row.last_reset_date,
        }
    }
}
