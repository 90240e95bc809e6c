//! Recurring schedule registration and self-renewal.
//!
//! For each schedule computed from a user's preferences the engine posts a
//! deferred `SCHEDULE_NOTIFICATION` to the transport and arms a local
//! renewal timer at the same instant. When the renewal fires it reloads the
//! preferences and registers the following occurrence. A superseded or
//! no longer wanted schedule is withdrawn with `CANCEL_SCHEDULE`, so the
//! transport never holds more than one pending entry per schedule id.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use chapel_core::factory::NotificationFactory;
use chapel_core::preferences::NotificationPreferences;
use chapel_core::schedule::{self, NotificationSchedule};
use chapel_core::types::UserKey;
use chrono::FixedOffset;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::store::PreferenceStore;
use crate::timer::{Timer, TimerHandle, TimerTask};
use crate::transport::{Transport, TransportMessage};

struct ActiveSchedule {
    schedule: NotificationSchedule,
    renewal: TimerHandle,
}

pub struct SchedulingEngine {
    store: Arc<PreferenceStore>,
    transport: Arc<dyn Transport>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    factory: NotificationFactory,
    tz: FixedOffset,
    /// Keyed by user, then schedule id. At most one live timer per pair.
    active: Mutex<HashMap<UserKey, HashMap<String, ActiveSchedule>>>,
    self_ref: Weak<SchedulingEngine>,
}

impl SchedulingEngine {
    pub fn new(
        store: Arc<PreferenceStore>,
        transport: Arc<dyn Transport>,
        timer: Arc<dyn Timer>,
        clock: Arc<dyn Clock>,
        tz: FixedOffset,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            store,
            transport,
            timer,
            clock,
            factory: NotificationFactory::new(tz),
            tz,
            active: Mutex::new(HashMap::new()),
            self_ref: self_ref.clone(),
        })
    }

    /// Schedules currently registered for `user`.
    pub async fn active_schedules(&self, user: &str) -> Vec<NotificationSchedule> {
        let active = self.active.lock().await;
        let mut schedules: Vec<_> = active
            .get(user)
            .map(|by_id| by_id.values().map(|a| a.schedule.clone()).collect())
            .unwrap_or_default();
        schedules.sort_by(|a, b| a.id.cmp(&b.id));
        schedules
    }

    /// Recompute and register every recurring schedule for `user`.
    ///
    /// Replaces any earlier registration with the same id and cancels kinds
    /// the preferences no longer call for. Returns what was registered.
    pub async fn update_scheduled_notifications(
        &self,
        user: &str,
        prefs: &NotificationPreferences,
    ) -> Vec<NotificationSchedule> {
        let now = self.clock.now();
        let schedules = schedule::compute_schedules(prefs, now, self.tz);

        let mut active = self.active.lock().await;
        let by_id = active.entry(user.to_string()).or_default();

        let dropped: Vec<String> = by_id
            .keys()
            .filter(|id| !schedules.iter().any(|s| &s.id == *id))
            .cloned()
            .collect();
        for id in dropped {
            if let Some(entry) = by_id.remove(&id) {
                entry.renewal.cancel();
            }
            self.withdraw(user, &id).await;
            tracing::info!(user, schedule_id = %id, "Recurring schedule cancelled");
        }

        let mut registered = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            if let Some(previous) = by_id.remove(&schedule.id) {
                previous.renewal.cancel();
                self.withdraw(user, &schedule.id).await;
            }

            let delay = match (schedule.scheduled_time - now).to_std() {
                Ok(delay) if !delay.is_zero() => delay,
                _ => {
                    tracing::debug!(
                        user,
                        schedule_id = %schedule.id,
                        "Schedule not in the future, skipping"
                    );
                    continue;
                }
            };

            let notification = self
                .factory
                .daily_devotion_reminder(prefs.devotions.language, schedule.scheduled_time);
            let message = TransportMessage::schedule(schedule.clone(), notification, delay);
            if let Err(e) = self.transport.post(message).await {
                tracing::warn!(
                    user,
                    schedule_id = %schedule.id,
                    error = %e,
                    "Failed to register schedule with transport"
                );
            }

            let renewal = self
                .timer
                .schedule_once(delay, renew_task(self.self_ref.clone(), user.to_string()));

            tracing::info!(
                user,
                schedule_id = %schedule.id,
                scheduled_time = %schedule.scheduled_time,
                delay_secs = delay.as_secs(),
                "Recurring schedule registered"
            );
            by_id.insert(
                schedule.id.clone(),
                ActiveSchedule {
                    schedule: schedule.clone(),
                    renewal,
                },
            );
            registered.push(schedule);
        }

        if by_id.is_empty() {
            active.remove(user);
        }
        registered
    }

    /// Ask the transport to drop its pending entry for `id`.
    async fn withdraw(&self, user: &str, id: &str) {
        if let Err(e) = self.transport.post(TransportMessage::cancel(id)).await {
            tracing::warn!(
                user,
                schedule_id = id,
                error = %e,
                "Failed to withdraw schedule from transport"
            );
        }
    }

    /// Cancel every renewal timer for every user.
    ///
    /// Registrations already handed to the transport stay in place.
    pub async fn cancel_all(&self) {
        let mut active = self.active.lock().await;
        for entry in active.values().flat_map(|by_id| by_id.values()) {
            entry.renewal.cancel();
        }
        active.clear();
    }
}

/// Timer task that reloads `user`'s preferences and registers the next
/// occurrence.
fn renew_task(engine: Weak<SchedulingEngine>, user: UserKey) -> TimerTask {
    Box::pin(async move {
        let Some(engine) = engine.upgrade() else {
            return;
        };
        let prefs = engine.store.get(&user).await;
        tracing::debug!(user = %user, "Renewing recurring schedules");
        let update: Pin<Box<dyn Future<Output = Vec<NotificationSchedule>> + Send + '_>> =
            Box::pin(engine.update_scheduled_notifications(&user, &prefs));
        update.await;
    })
}
