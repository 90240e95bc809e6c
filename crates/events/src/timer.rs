//! One-shot timers with cancellable handles.
//!
//! [`Timer`] is the seam between the gate/scheduler and real time. The
//! production [`TokioTimer`] spawns a task per timer; tests substitute a
//! timer they fire by hand.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Work to run when a timer fires.
pub type TimerTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Handle to a pending timer. Cancelling is idempotent.
#[derive(Debug, Clone, Default)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Token that resolves when the handle is cancelled.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

pub trait Timer: Send + Sync {
    /// Run `task` once after `delay` unless the returned handle is cancelled
    /// first.
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}

/// Timer backed by `tokio::time::sleep` on the ambient runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioTimer;

impl Timer for TokioTimer {
    fn schedule_once(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new();
        let token = handle.token().clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !token.is_cancelled() {
                        task.await;
                    }
                }
            }
        });
        handle
    }
}
