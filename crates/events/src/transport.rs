//! Delivery surface abstraction.
//!
//! The host surface (a service worker, a push gateway, a desktop shell)
//! receives [`TransportMessage`]s and displays or defers them. It reports
//! clicks and closes back as [`TransportEvent`](chapel_core::engagement::TransportEvent)s.

use async_trait::async_trait;
use chapel_core::notification::ChurchNotification;
use chapel_core::schedule::NotificationSchedule;
use chapel_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::NotifyError;

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Outbound message to the delivery surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportMessage {
    /// Display `notification` after `delay` milliseconds.
    ///
    /// The surface keeps one pending entry per `schedule.id`; a later
    /// registration with the same id replaces the earlier one.
    #[serde(rename_all = "camelCase")]
    ScheduleNotification {
        schedule: NotificationSchedule,
        notification: ChurchNotification,
        delay: u64,
        schedule_time: Timestamp,
    },
    /// Display `notification` now.
    ShowNotification { notification: ChurchNotification },
    /// Drop the pending entry registered under `id`, if any.
    CancelSchedule { id: String },
}

impl TransportMessage {
    pub fn show(notification: ChurchNotification) -> Self {
        Self::ShowNotification { notification }
    }

    pub fn schedule(
        schedule: NotificationSchedule,
        notification: ChurchNotification,
        delay: std::time::Duration,
    ) -> Self {
        let schedule_time = schedule.scheduled_time;
        Self::ScheduleNotification {
            schedule,
            notification,
            delay: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            schedule_time,
        }
    }

    pub fn cancel(id: impl Into<String>) -> Self {
        Self::CancelSchedule { id: id.into() }
    }

    pub fn notification(&self) -> Option<&ChurchNotification> {
        match self {
            Self::ScheduleNotification { notification, .. } => Some(notification),
            Self::ShowNotification { notification } => Some(notification),
            Self::CancelSchedule { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether the surface can display notifications at all.
    fn is_supported(&self) -> bool;

    async fn post(&self, message: TransportMessage) -> Result<(), NotifyError>;
}

/// Transport that forwards every message into an unbounded channel.
///
/// The receiving half belongs to whatever bridges to the real surface.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<TransportMessage>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    fn is_supported(&self) -> bool {
        !self.tx.is_closed()
    }

    async fn post(&self, message: TransportMessage) -> Result<(), NotifyError> {
        self.tx
            .send(message)
            .map_err(|_| NotifyError::Transport("delivery surface has gone away".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapel_core::factory::NotificationFactory;
    use chapel_core::i18n::Language;
    use chapel_core::schedule::compute_schedules;
    use chapel_core::preferences::NotificationPreferences;
    use chrono::{FixedOffset, TimeZone, Utc};
    use std::time::Duration;

    fn reminder() -> ChurchNotification {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        NotificationFactory::new(tz).daily_devotion_reminder(Language::En, Utc::now())
    }

    #[test]
    fn show_message_wire_format() {
        let json = serde_json::to_value(TransportMessage::show(reminder())).unwrap();
        assert_eq!(json["type"], "SHOW_NOTIFICATION");
        assert_eq!(json["notification"]["type"], "reminder");
    }

    #[test]
    fn schedule_message_carries_delay_in_millis() {
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let schedule = compute_schedules(&NotificationPreferences::default(), now, tz)
            .pop()
            .unwrap();
        let message = TransportMessage::schedule(schedule, reminder(), Duration::from_secs(3600));
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "SCHEDULE_NOTIFICATION");
        assert_eq!(json["delay"], 3_600_000);
        assert_eq!(json["schedule"]["id"], "daily-devotion");
        assert!(json["scheduleTime"].is_string());
    }

    #[test]
    fn cancel_message_wire_format() {
        let message = TransportMessage::cancel("daily-devotion");
        assert!(message.notification().is_none());
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "CANCEL_SCHEDULE", "id": "daily-devotion" }));
    }

    #[tokio::test]
    async fn channel_transport_forwards_and_detects_closed_receiver() {
        let (transport, mut rx) = ChannelTransport::new();
        assert!(transport.is_supported());
        transport.post(TransportMessage::show(reminder())).await.unwrap();
        assert!(matches!(
            rx.recv().await,
            Some(TransportMessage::ShowNotification { .. })
        ));

        drop(rx);
        assert!(!transport.is_supported());
        assert!(transport.post(TransportMessage::show(reminder())).await.is_err());
    }
}
