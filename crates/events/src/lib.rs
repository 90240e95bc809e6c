//! Chapel notification runtime.
//!
//! Wires the pure logic in `chapel-core` to storage, timers, and the
//! delivery surface:
//!
//! - [`PreferenceStore`] loads and saves preferences through a local JSON
//!   cache and an optional Postgres mirror.
//! - [`SchedulingEngine`] registers recurring schedules and renews them.
//! - [`DeliveryGate`] applies preferences, batches, and caps daily volume.
//! - [`EngagementTracker`] maps clicks to effects and reports them.
//! - [`NotificationService`] is the single entry point that owns them all.

pub mod clock;
pub mod config;
pub mod engagement;
pub mod error;
pub mod gate;
pub mod reporting;
pub mod scheduler;
pub mod service;
pub mod store;
pub mod timer;
pub mod transport;

pub use config::NotifyConfig;
pub use engagement::{EngagementEffect, EngagementTracker};
pub use error::NotifyError;
pub use gate::{DeliveryGate, SendOutcome};
pub use scheduler::SchedulingEngine;
pub use service::NotificationService;
pub use store::PreferenceStore;
pub use transport::{ChannelTransport, Transport, TransportMessage};
