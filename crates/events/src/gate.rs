//! Delivery gate and batcher.
//!
//! [`DeliveryGate::send`] is the single entry point for immediate
//! notifications. It applies the preference policy, routes urgent items
//! past the batch, queues everything else for one batch window, and
//! enforces the per-user daily cap at the moment of delivery.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use chapel_core::notification::ChurchNotification;
use chapel_core::policy::{self, DailyCounter, Route, Suppression};
use chapel_core::types::UserKey;
use chrono::FixedOffset;
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::error::NotifyError;
use crate::store::PreferenceStore;
use crate::timer::{Timer, TimerHandle};
use crate::transport::{Transport, TransportMessage};

/// Default time a non-urgent notification waits for companions.
pub const DEFAULT_BATCH_WINDOW: Duration = Duration::from_secs(120);

/// Durable home for [`DailyCounter`]s. Failures are logged, never fatal.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn load(&self, user: &str) -> Result<Option<DailyCounter>, NotifyError>;

    async fn save(&self, user: &str, counter: &DailyCounter) -> Result<(), NotifyError>;
}

/// What happened to a notification handed to [`DeliveryGate::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The gate is not initialized or the surface cannot display anything.
    Unsupported,
    Suppressed(Suppression),
    /// Queued; delivered at the next flush.
    Batched,
    Sent,
    /// Admitted, but the transport rejected it.
    TransportFailed,
}

struct Queued {
    user: UserKey,
    notification: ChurchNotification,
    max_per_day: u32,
}

#[derive(Default)]
struct BatchState {
    queue: Vec<Queued>,
    flush_timer: Option<TimerHandle>,
}

// ---------------------------------------------------------------------------
// DeliveryGate
// ---------------------------------------------------------------------------

pub struct DeliveryGate {
    store: Arc<PreferenceStore>,
    transport: Arc<dyn Transport>,
    timer: Arc<dyn Timer>,
    clock: Arc<dyn Clock>,
    counter_store: Option<Arc<dyn CounterStore>>,
    tz: FixedOffset,
    batch_window: Duration,
    ready: AtomicBool,
    batch: Mutex<BatchState>,
    counters: Mutex<HashMap<UserKey, DailyCounter>>,
    self_ref: Weak<DeliveryGate>,
}

/// Construction parameters for [`DeliveryGate`].
pub struct GateDeps {
    pub store: Arc<PreferenceStore>,
    pub transport: Arc<dyn Transport>,
    pub timer: Arc<dyn Timer>,
    pub clock: Arc<dyn Clock>,
    pub counter_store: Option<Arc<dyn CounterStore>>,
    pub tz: FixedOffset,
    pub batch_window: Duration,
}

impl DeliveryGate {
    pub fn new(deps: GateDeps) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            store: deps.store,
            transport: deps.transport,
            timer: deps.timer,
            clock: deps.clock,
            counter_store: deps.counter_store,
            tz: deps.tz,
            batch_window: deps.batch_window,
            ready: AtomicBool::new(false),
            batch: Mutex::new(BatchState::default()),
            counters: Mutex::new(HashMap::new()),
            self_ref: self_ref.clone(),
        })
    }

    /// Allow or block all further sends.
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Number of notifications waiting for the next flush.
    pub async fn pending(&self) -> usize {
        self.batch.lock().await.queue.len()
    }

    /// Evaluate and route one notification for `user`.
    pub async fn send(&self, user: &str, notification: ChurchNotification) -> SendOutcome {
        if !self.is_ready() || !self.transport.is_supported() {
            tracing::debug!(
                user,
                tag = notification.tag(),
                "Delivery unavailable, dropping notification"
            );
            return SendOutcome::Unsupported;
        }

        let prefs = self.store.get(user).await;
        let now = self.clock.now();

        match policy::evaluate(&prefs, &notification, now, self.tz) {
            Err(reason) => {
                tracing::info!(
                    user,
                    tag = notification.tag(),
                    reason = reason.as_str(),
                    "Notification suppressed"
                );
                SendOutcome::Suppressed(reason)
            }
            Ok(Route::Urgent) => {
                self.flush().await;
                self.deliver(user, &notification, prefs.max_per_day).await
            }
            Ok(Route::Batch) => {
                self.enqueue(Queued {
                    user: user.to_string(),
                    notification,
                    max_per_day: prefs.max_per_day,
                })
                .await;
                SendOutcome::Batched
            }
            Ok(Route::Immediate) => self.deliver(user, &notification, prefs.max_per_day).await,
        }
    }

    /// Deliver every queued notification in arrival order and disarm the
    /// flush timer. Returns how many were handed to the transport.
    pub async fn flush(&self) -> usize {
        let (items, timer) = {
            let mut state = self.batch.lock().await;
            (std::mem::take(&mut state.queue), state.flush_timer.take())
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
        if items.is_empty() {
            return 0;
        }

        tracing::debug!(count = items.len(), "Flushing notification batch");
        let mut sent = 0;
        for item in items {
            let outcome = self
                .deliver(&item.user, &item.notification, item.max_per_day)
                .await;
            if outcome == SendOutcome::Sent {
                sent += 1;
            }
        }
        sent
    }

    async fn enqueue(&self, item: Queued) {
        let mut state = self.batch.lock().await;
        tracing::debug!(user = %item.user, tag = item.notification.tag(), "Notification batched");
        state.queue.push(item);

        if state.flush_timer.is_none() {
            let gate = self.self_ref.clone();
            let handle = self.timer.schedule_once(
                self.batch_window,
                Box::pin(async move {
                    if let Some(gate) = gate.upgrade() {
                        gate.flush().await;
                    }
                }),
            );
            state.flush_timer = Some(handle);
        }
    }

    /// Charge the daily counter, then hand the notification to the transport.
    async fn deliver(
        &self,
        user: &str,
        notification: &ChurchNotification,
        max_per_day: u32,
    ) -> SendOutcome {
        let Some(counter) = self.consume(user, max_per_day).await else {
            tracing::info!(
                user,
                tag = notification.tag(),
                reason = Suppression::DailyCap.as_str(),
                max_per_day,
                "Notification suppressed"
            );
            return SendOutcome::Suppressed(Suppression::DailyCap);
        };

        if let Some(counter_store) = &self.counter_store {
            if let Err(e) = counter_store.save(user, &counter).await {
                tracing::warn!(user, error = %e, "Failed to persist delivery counter");
            }
        }

        match self.transport.post(TransportMessage::show(notification.clone())).await {
            Ok(()) => {
                tracing::info!(
                    user,
                    tag = notification.tag(),
                    category = notification.category().as_str(),
                    "Notification sent"
                );
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::error!(
                    user,
                    tag = notification.tag(),
                    error = %e,
                    "Transport rejected notification"
                );
                SendOutcome::TransportFailed
            }
        }
    }

    /// Consume one slot of today's allowance. `None` when the cap is hit.
    async fn consume(&self, user: &str, max_per_day: u32) -> Option<DailyCounter> {
        let loaded = if self.counters.lock().await.contains_key(user) {
            None
        } else {
            self.load_counter(user).await
        };

        let today = self.clock.now().with_timezone(&self.tz).date_naive();
        let mut counters = self.counters.lock().await;
        let counter = counters
            .entry(user.to_string())
            .or_insert_with(|| loaded.unwrap_or_default());
        if counter.try_consume(today, max_per_day) {
            Some(counter.clone())
        } else {
            None
        }
    }

    async fn load_counter(&self, user: &str) -> Option<DailyCounter> {
        let counter_store = self.counter_store.as_ref()?;
        match counter_store.load(user).await {
            Ok(counter) => counter,
            Err(e) => {
                tracing::warn!(user, error = %e, "Failed to load delivery counter");
                None
            }
        }
    }
}
