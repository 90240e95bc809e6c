//! Shared fixtures for notification runtime integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chapel_core::factory::{PrayerRequestRecord, ReminderRecord};
use chapel_core::notification::PrayerRequestType;
use chapel_core::schedule::NotificationSchedule;
use chapel_core::types::Timestamp;
use chapel_events::clock::FixedClock;
use chapel_events::store::MemoryPreferenceCache;
use chapel_events::timer::{Timer, TimerHandle, TimerTask};
use chapel_events::{NotificationService, NotifyError, Transport, TransportMessage};
use chrono::{FixedOffset, TimeZone, Utc};

pub const USER: &str = "member-1";

pub fn tz() -> FixedOffset {
    FixedOffset::east_opt(8 * 3600).unwrap()
}

/// A local wall-clock instant at +08:00, as UTC.
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
    tz().with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

// ---------------------------------------------------------------------------
// ManualTimer
// ---------------------------------------------------------------------------

struct Armed {
    delay: Duration,
    handle: TimerHandle,
    task: TimerTask,
}

/// Timer that only fires when a test calls [`ManualTimer::fire_all`].
#[derive(Default)]
pub struct ManualTimer {
    armed: Mutex<Vec<Armed>>,
}

impl ManualTimer {
    /// Delays of timers that are neither fired nor cancelled.
    pub fn live_delays(&self) -> Vec<Duration> {
        self.armed
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.handle.is_cancelled())
            .map(|a| a.delay)
            .collect()
    }

    /// Run every live timer once. Timers armed while firing wait for the
    /// next call.
    pub async fn fire_all(&self) -> usize {
        let due: Vec<Armed> = std::mem::take(&mut *self.armed.lock().unwrap());
        let mut fired = 0;
        for armed in due {
            if !armed.handle.is_cancelled() {
                armed.task.await;
                fired += 1;
            }
        }
        fired
    }
}

impl Timer for ManualTimer {
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new();
        self.armed.lock().unwrap().push(Armed {
            delay,
            handle: handle.clone(),
            task,
        });
        handle
    }
}

// ---------------------------------------------------------------------------
// RecordingTransport
// ---------------------------------------------------------------------------

pub struct RecordingTransport {
    supported: AtomicBool,
    failing: AtomicBool,
    messages: Mutex<Vec<TransportMessage>>,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            supported: AtomicBool::new(true),
            failing: AtomicBool::new(false),
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl RecordingTransport {
    pub fn set_supported(&self, supported: bool) {
        self.supported.store(supported, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Tags of every notification shown immediately, in order.
    pub fn shown_tags(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                TransportMessage::ShowNotification { notification } => {
                    Some(notification.tag().to_string())
                }
                _ => None,
            })
            .collect()
    }

    /// Every deferred registration with its delay in milliseconds.
    pub fn scheduled(&self) -> Vec<(NotificationSchedule, u64)> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                TransportMessage::ScheduleNotification {
                    schedule, delay, ..
                } => Some((schedule.clone(), *delay)),
                _ => None,
            })
            .collect()
    }

    /// Registrations the surface would still fire, replaying every schedule
    /// and cancel message in order. Sorted by fire time.
    pub fn pending_schedules(&self) -> Vec<NotificationSchedule> {
        let mut pending: HashMap<String, NotificationSchedule> = HashMap::new();
        for message in self.messages.lock().unwrap().iter() {
            match message {
                TransportMessage::ScheduleNotification { schedule, .. } => {
                    pending.insert(schedule.id.clone(), schedule.clone());
                }
                TransportMessage::CancelSchedule { id } => {
                    pending.remove(id);
                }
                TransportMessage::ShowNotification { .. } => {}
            }
        }
        let mut pending: Vec<_> = pending.into_values().collect();
        pending.sort_by_key(|s| s.scheduled_time);
        pending
    }

    /// Ids withdrawn with `CANCEL_SCHEDULE`, in order.
    pub fn cancelled_ids(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| match m {
                TransportMessage::CancelSchedule { id } => Some(id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn is_supported(&self) -> bool {
        self.supported.load(Ordering::SeqCst)
    }

    async fn post(&self, message: TransportMessage) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Transport("surface unavailable".into()));
        }
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub service: NotificationService,
    pub transport: Arc<RecordingTransport>,
    pub timer: Arc<ManualTimer>,
    pub clock: Arc<FixedClock>,
    pub cache: Arc<MemoryPreferenceCache>,
}

pub fn harness(now: Timestamp) -> Harness {
    let transport = Arc::new(RecordingTransport::default());
    let timer = Arc::new(ManualTimer::default());
    let clock = Arc::new(FixedClock::new(now));
    let cache = Arc::new(MemoryPreferenceCache::default());
    let service = NotificationService::builder(transport.clone())
        .with_timer(timer.clone())
        .with_clock(clock.clone())
        .with_local_cache(cache.clone())
        .with_time_zone(tz())
        .with_batch_window(Duration::from_secs(120))
        .build();
    Harness {
        service,
        transport,
        timer,
        clock,
        cache,
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

pub fn prayer_record(id: &str, request_type: PrayerRequestType) -> PrayerRequestRecord {
    PrayerRequestRecord {
        id: id.into(),
        title: format!("Request {id}"),
        description: "Please pray for our family this week.".into(),
        request_type,
    }
}

pub fn reminder_record(id: &str) -> ReminderRecord {
    ReminderRecord {
        id: id.into(),
        title: None,
        body: format!("Reminder {id}"),
        url: format!("/reminders/{id}"),
    }
}
