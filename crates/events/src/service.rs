//! [`NotificationService`]: the context object the host app talks to.
//!
//! Owns the preference store, scheduling engine, delivery gate, and
//! engagement tracker, and exposes one method per operation. Every method
//! except [`set_preferences`](NotificationService::set_preferences) logs and
//! degrades instead of returning errors.

use std::sync::Arc;
use std::time::Duration;

use chapel_core::engagement::{SavedItem, TransportEvent};
use chapel_core::factory::{
    DevotionRecord, EventRecord, GroupMessageRecord, NotificationFactory, PrayerRequestRecord,
    ReminderRecord,
};
use chapel_core::notification::ChurchNotification;
use chapel_core::preferences::NotificationPreferences;
use chapel_core::schedule::NotificationSchedule;
use chrono::FixedOffset;

use crate::clock::{Clock, SystemClock};
use crate::config::{default_civil_offset, NotifyConfig};
use crate::engagement::{EngagementEffect, EngagementTracker};
use crate::error::NotifyError;
use crate::gate::{CounterStore, DeliveryGate, GateDeps, SendOutcome, DEFAULT_BATCH_WINDOW};
use crate::reporting::{EngagementReporter, LogReporter};
use crate::scheduler::SchedulingEngine;
use crate::store::{MemoryPreferenceCache, PreferenceBackend, PreferenceStore};
use crate::timer::{Timer, TokioTimer};
use crate::transport::Transport;

pub struct NotificationService {
    store: Arc<PreferenceStore>,
    scheduler: Arc<SchedulingEngine>,
    gate: Arc<DeliveryGate>,
    tracker: EngagementTracker,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    factory: NotificationFactory,
}

impl NotificationService {
    pub fn builder(transport: Arc<dyn Transport>) -> NotificationServiceBuilder {
        NotificationServiceBuilder::new(transport)
    }

    /// Check the delivery surface and register recurring schedules for
    /// `user`. Returns `false` when the surface is unsupported; every send
    /// is then a no-op.
    pub async fn initialize(&self, user: &str) -> bool {
        if !self.transport.is_supported() {
            tracing::warn!(user, "Notifications are not supported by the delivery surface");
            self.gate.set_ready(false);
            return false;
        }

        let prefs = self.store.get(user).await;
        let schedules = self.scheduler.update_scheduled_notifications(user, &prefs).await;
        self.gate.set_ready(true);
        tracing::info!(user, schedules = schedules.len(), "Notification service initialized");
        true
    }

    pub async fn preferences(&self, user: &str) -> NotificationPreferences {
        self.store.get(user).await
    }

    /// Replace `user`'s preferences and recompute their recurring schedules.
    pub async fn set_preferences(
        &self,
        user: &str,
        prefs: NotificationPreferences,
    ) -> Result<Vec<NotificationSchedule>, NotifyError> {
        self.store.set(user, &prefs).await?;
        tracing::info!(user, "Notification preferences updated");
        Ok(self.scheduler.update_scheduled_notifications(user, &prefs).await)
    }

    /// Schedules currently registered for `user`.
    pub async fn scheduled(&self, user: &str) -> Vec<NotificationSchedule> {
        self.scheduler.active_schedules(user).await
    }

    // -----------------------------------------------------------------------
    // Sending
    // -----------------------------------------------------------------------

    /// Route an already built notification through the delivery gate.
    pub async fn send(&self, user: &str, notification: ChurchNotification) -> SendOutcome {
        self.gate.send(user, notification).await
    }

    pub async fn notify_devotion(&self, user: &str, record: &DevotionRecord) -> SendOutcome {
        let prefs = self.store.get(user).await;
        let notification = self
            .factory
            .create_devotion_notification(record, &prefs, self.clock.now());
        self.gate.send(user, notification).await
    }

    pub async fn notify_prayer(&self, user: &str, record: &PrayerRequestRecord) -> SendOutcome {
        let prefs = self.store.get(user).await;
        let notification = self
            .factory
            .create_prayer_notification(record, &prefs, self.clock.now());
        self.gate.send(user, notification).await
    }

    pub async fn notify_event(&self, user: &str, record: &EventRecord) -> SendOutcome {
        let prefs = self.store.get(user).await;
        let notification = self
            .factory
            .create_event_notification(record, &prefs, self.clock.now());
        self.gate.send(user, notification).await
    }

    pub async fn notify_community(&self, user: &str, record: &GroupMessageRecord) -> SendOutcome {
        let prefs = self.store.get(user).await;
        let notification = self
            .factory
            .create_community_notification(record, &prefs, self.clock.now());
        self.gate.send(user, notification).await
    }

    pub async fn notify_reminder(&self, user: &str, record: &ReminderRecord) -> SendOutcome {
        let prefs = self.store.get(user).await;
        let notification = self
            .factory
            .create_reminder_notification(record, &prefs, self.clock.now());
        self.gate.send(user, notification).await
    }

    /// Deliver any batched notifications now.
    pub async fn flush(&self) -> usize {
        self.gate.flush().await
    }

    pub async fn pending(&self) -> usize {
        self.gate.pending().await
    }

    // -----------------------------------------------------------------------
    // Engagement
    // -----------------------------------------------------------------------

    pub async fn handle_event(&self, event: TransportEvent) -> EngagementEffect {
        self.tracker.handle(event).await
    }

    pub async fn saved_items(&self) -> Vec<SavedItem> {
        self.tracker.saved_items().await
    }

    /// Flush pending batches and cancel every renewal timer.
    pub async fn shutdown(&self) {
        let flushed = self.gate.flush().await;
        self.scheduler.cancel_all().await;
        self.gate.set_ready(false);
        tracing::info!(flushed, "Notification service stopped");
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct NotificationServiceBuilder {
    transport: Arc<dyn Transport>,
    local: Arc<dyn PreferenceBackend>,
    server: Option<Arc<dyn PreferenceBackend>>,
    counter_store: Option<Arc<dyn CounterStore>>,
    reporter: Arc<dyn EngagementReporter>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    tz: FixedOffset,
    batch_window: Duration,
}

impl NotificationServiceBuilder {
    fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            local: Arc::new(MemoryPreferenceCache::default()),
            server: None,
            counter_store: None,
            reporter: Arc::new(LogReporter),
            timer: Arc::new(TokioTimer),
            clock: Arc::new(SystemClock),
            tz: default_civil_offset(),
            batch_window: DEFAULT_BATCH_WINDOW,
        }
    }

    /// Apply the civil offset and batch window from `config`.
    pub fn with_config(mut self, config: &NotifyConfig) -> Self {
        self.tz = config.civil_offset;
        self.batch_window = config.batch_window;
        self
    }

    pub fn with_local_cache(mut self, local: Arc<dyn PreferenceBackend>) -> Self {
        self.local = local;
        self
    }

    pub fn with_server_mirror(mut self, server: Arc<dyn PreferenceBackend>) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_counter_store(mut self, counter_store: Arc<dyn CounterStore>) -> Self {
        self.counter_store = Some(counter_store);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn EngagementReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_time_zone(mut self, tz: FixedOffset) -> Self {
        self.tz = tz;
        self
    }

    pub fn with_batch_window(mut self, batch_window: Duration) -> Self {
        self.batch_window = batch_window;
        self
    }

    pub fn build(self) -> NotificationService {
        let mut store = PreferenceStore::new(self.local);
        if let Some(server) = self.server {
            store = store.with_server(server);
        }
        let store = Arc::new(store);

        let scheduler = SchedulingEngine::new(
            Arc::clone(&store),
            Arc::clone(&self.transport),
            Arc::clone(&self.timer),
            Arc::clone(&self.clock),
            self.tz,
        );
        let gate = DeliveryGate::new(GateDeps {
            store: Arc::clone(&store),
            transport: Arc::clone(&self.transport),
            timer: self.timer,
            clock: Arc::clone(&self.clock),
            counter_store: self.counter_store,
            tz: self.tz,
            batch_window: self.batch_window,
        });

        NotificationService {
            store,
            scheduler,
            gate,
            tracker: EngagementTracker::new(self.reporter, Arc::clone(&self.clock)),
            transport: self.transport,
            clock: self.clock,
            factory: NotificationFactory::new(self.tz),
        }
    }
}
