//! Preference persistence with local cache, server mirror, and defaults.
//!
//! [`PreferenceStore::get`] never fails: it tries the server mirror, then
//! the local cache, then falls back to defaults which it persists to both.
//! When every write fails the value is held in memory for the process
//! lifetime so repeated reads stay consistent.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chapel_core::preferences::NotificationPreferences;
use chapel_core::types::UserKey;
use tokio::sync::RwLock;

use crate::error::NotifyError;

pub mod file;
pub mod memory;
pub mod postgres;

pub use file::FilePreferenceCache;
pub use memory::{MemoryCounterStore, MemoryPreferenceCache};
pub use postgres::{PgCounterStore, PgPreferenceMirror};

/// A place preferences can be loaded from and saved to.
#[async_trait]
pub trait PreferenceBackend: Send + Sync {
    /// Short name used in log fields.
    fn name(&self) -> &'static str;

    async fn load(&self, user: &str) -> Result<Option<NotificationPreferences>, NotifyError>;

    async fn save(&self, user: &str, prefs: &NotificationPreferences) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// PreferenceStore
// ---------------------------------------------------------------------------

pub struct PreferenceStore {
    local: Arc<dyn PreferenceBackend>,
    server: Option<Arc<dyn PreferenceBackend>>,
    /// Values no backend accepted.
    ephemeral: RwLock<HashMap<UserKey, NotificationPreferences>>,
}

impl PreferenceStore {
    pub fn new(local: Arc<dyn PreferenceBackend>) -> Self {
        Self {
            local,
            server: None,
            ephemeral: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_server(mut self, server: Arc<dyn PreferenceBackend>) -> Self {
        self.server = Some(server);
        self
    }

    /// Current preferences for `user`. Always returns a value.
    pub async fn get(&self, user: &str) -> NotificationPreferences {
        if let Some(prefs) = self.ephemeral.read().await.get(user) {
            return prefs.clone();
        }

        if let Some(server) = &self.server {
            match server.load(user).await {
                Ok(Some(prefs)) => {
                    if let Err(e) = self.local.save(user, &prefs).await {
                        tracing::warn!(
                            user,
                            backend = self.local.name(),
                            error = %e,
                            "Failed to refresh local preference cache"
                        );
                    }
                    return prefs;
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        user,
                        backend = server.name(),
                        error = %e,
                        "Failed to load preferences"
                    );
                }
            }
        }

        match self.local.load(user).await {
            Ok(Some(prefs)) => return prefs,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    user,
                    backend = self.local.name(),
                    error = %e,
                    "Failed to load preferences"
                );
            }
        }

        let defaults = NotificationPreferences::default();
        tracing::debug!(user, "No stored preferences, using defaults");
        self.persist(user, &defaults).await;
        defaults
    }

    /// Validate and store `prefs` for `user`, replacing the previous value.
    ///
    /// Only validation failures are returned; storage failures are logged
    /// and the value is kept in memory instead.
    pub async fn set(
        &self,
        user: &str,
        prefs: &NotificationPreferences,
    ) -> Result<(), NotifyError> {
        prefs.validate_all()?;
        self.persist(user, prefs).await;
        Ok(())
    }

    /// Write to every backend, holding the value in memory if none accepts it.
    async fn persist(&self, user: &str, prefs: &NotificationPreferences) {
        let mut stored = match self.local.save(user, prefs).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(
                    user,
                    backend = self.local.name(),
                    error = %e,
                    "Failed to save preferences"
                );
                false
            }
        };

        if let Some(server) = &self.server {
            match server.save(user, prefs).await {
                Ok(()) => stored = true,
                Err(e) => {
                    tracing::warn!(
                        user,
                        backend = server.name(),
                        error = %e,
                        "Failed to save preferences"
                    );
                }
            }
        }

        let mut ephemeral = self.ephemeral.write().await;
        if stored {
            ephemeral.remove(user);
        } else {
            tracing::warn!(user, "Preferences held in memory only");
            ephemeral.insert(user.to_string(), prefs.clone());
        }
    }
}
