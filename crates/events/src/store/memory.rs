//! In-memory backends, for tests and for running without any storage.

use std::collections::HashMap;

use async_trait::async_trait;
use chapel_core::policy::DailyCounter;
use chapel_core::preferences::NotificationPreferences;
use chapel_core::types::UserKey;
use tokio::sync::RwLock;

use super::PreferenceBackend;
use crate::error::NotifyError;
use crate::gate::CounterStore;

#[derive(Debug, Default)]
pub struct MemoryPreferenceCache {
    entries: RwLock<HashMap<UserKey, NotificationPreferences>>,
}

#[async_trait]
impl PreferenceBackend for MemoryPreferenceCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self, user: &str) -> Result<Option<NotificationPreferences>, NotifyError> {
        Ok(self.entries.read().await.get(user).cloned())
    }

    async fn save(&self, user: &str, prefs: &NotificationPreferences) -> Result<(), NotifyError> {
        self.entries
            .write()
            .await
            .insert(user.to_string(), prefs.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    entries: RwLock<HashMap<UserKey, DailyCounter>>,
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn load(&self, user: &str) -> Result<Option<DailyCounter>, NotifyError> {
        Ok(self.entries.read().await.get(user).cloned())
    }

    async fn save(&self, user: &str, counter: &DailyCounter) -> Result<(), NotifyError> {
        self.entries
            .write()
            .await
            .insert(user.to_string(), counter.clone());
        Ok(())
    }
}
