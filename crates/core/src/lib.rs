//! Chapel notification core.
//!
//! Pure domain logic with no I/O: preference model, localization,
//! quiet-hours and holiday calendar, notification builders, schedule
//! computation, delivery policy, and engagement mapping. The events crate
//! wires these to storage, timers, and the delivery transport.

pub mod calendar;
pub mod engagement;
pub mod error;
pub mod factory;
pub mod i18n;
pub mod notification;
pub mod policy;
pub mod preferences;
pub mod schedule;
pub mod types;
