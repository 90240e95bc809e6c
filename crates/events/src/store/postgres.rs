//! Server-side backends over the `chapel-db` repositories.

use async_trait::async_trait;
use chapel_core::policy::DailyCounter;
use chapel_core::preferences::NotificationPreferences;
use chapel_db::repositories::{DeliveryCounterRepo, PreferenceRepo};
use chapel_db::DbPool;

use super::PreferenceBackend;
use crate::error::NotifyError;
use crate::gate::CounterStore;

/// Server mirror of user preferences in `notification_preferences`.
#[derive(Debug, Clone)]
pub struct PgPreferenceMirror {
    pool: DbPool,
}

impl PgPreferenceMirror {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceBackend for PgPreferenceMirror {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn load(&self, user: &str) -> Result<Option<NotificationPreferences>, NotifyError> {
        match PreferenceRepo::get(&self.pool, user).await? {
            Some(row) => Ok(Some(NotificationPreferences::from_json(&row.preferences)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, user: &str, prefs: &NotificationPreferences) -> Result<(), NotifyError> {
        let value = serde_json::to_value(prefs)?;
        PreferenceRepo::replace(&self.pool, user, &value).await?;
        Ok(())
    }
}

/// Daily delivery counters in `delivery_counters`.
#[derive(Debug, Clone)]
pub struct PgCounterStore {
    pool: DbPool,
}

impl PgCounterStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn load(&self, user: &str) -> Result<Option<DailyCounter>, NotifyError> {
        Ok(DeliveryCounterRepo::get(&self.pool, user)
            .await?
            .map(DailyCounter::from))
    }

    async fn save(&self, user: &str, counter: &DailyCounter) -> Result<(), NotifyError> {
        DeliveryCounterRepo::upsert(&self.pool, user, counter).await?;
        Ok(())
    }
}
