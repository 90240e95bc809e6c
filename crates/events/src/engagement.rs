//! Engagement tracker: turns click/close events into in-app effects and
//! reports every event upstream without blocking the caller.

use std::sync::Arc;

use chapel_core::engagement::{
    self, ClickIntent, EngagementReport, SavedItem, TransportEvent, TransportEventKind,
};
use tokio::sync::Mutex;

use crate::clock::Clock;
use crate::reporting::EngagementReporter;

/// External map search used by the `directions` action.
pub const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/";

/// Saved list capacity; the oldest entries are dropped beyond it.
pub const MAX_SAVED_ITEMS: usize = 100;

/// What the host app should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngagementEffect {
    /// Focus the app and open an in-app path.
    Navigate(String),
    /// Open an absolute external URL.
    OpenExternal(String),
    /// The item is on the saved list (newly added or already there).
    Saved(SavedItem),
    /// Nothing to do beyond reporting (close events).
    None,
}

pub struct EngagementTracker {
    reporter: Arc<dyn EngagementReporter>,
    clock: Arc<dyn Clock>,
    saved: Mutex<Vec<SavedItem>>,
}

/// Map search link for a free-text location.
pub fn directions_url(location: &str) -> Option<String> {
    reqwest::Url::parse_with_params(MAP_SEARCH_URL, &[("api", "1"), ("query", location)])
        .ok()
        .map(|url| url.to_string())
}

impl EngagementTracker {
    pub fn new(reporter: Arc<dyn EngagementReporter>, clock: Arc<dyn Clock>) -> Self {
        Self {
            reporter,
            clock,
            saved: Mutex::new(Vec::new()),
        }
    }

    /// Items saved so far, oldest first.
    pub async fn saved_items(&self) -> Vec<SavedItem> {
        self.saved.lock().await.clone()
    }

    /// Handle one click or close event.
    ///
    /// The upstream report is spawned and never awaited; its failure is
    /// logged only.
    pub async fn handle(&self, event: TransportEvent) -> EngagementEffect {
        let now = self.clock.now();
        self.spawn_report(EngagementReport::from_event(&event, now));

        if event.kind == TransportEventKind::Close {
            return EngagementEffect::None;
        }

        match engagement::click_intent(event.action.as_deref(), &event.data) {
            ClickIntent::Navigate(path) | ClickIntent::PrayerMode(path) => {
                EngagementEffect::Navigate(path)
            }
            ClickIntent::Save => {
                let mut saved = self.saved.lock().await;
                if let Some(existing) = saved
                    .iter()
                    .find(|s| s.id == event.data.id && s.category == event.data.category)
                {
                    tracing::debug!(id = %existing.id, "Notification item already saved");
                    return EngagementEffect::Saved(existing.clone());
                }

                let item = SavedItem {
                    id: event.data.id.clone(),
                    category: event.data.category,
                    url: event.data.url.clone(),
                    saved_at: now,
                };
                saved.push(item.clone());
                if saved.len() > MAX_SAVED_ITEMS {
                    let excess = saved.len() - MAX_SAVED_ITEMS;
                    saved.drain(..excess);
                }
                tracing::debug!(id = %item.id, "Notification item saved");
                EngagementEffect::Saved(item)
            }
            ClickIntent::Directions(location) => match directions_url(&location) {
                Some(url) => EngagementEffect::OpenExternal(url),
                None => {
                    tracing::warn!(location = %location, "Could not build directions link");
                    EngagementEffect::Navigate(event.data.url.clone())
                }
            },
        }
    }

    fn spawn_report(&self, report: EngagementReport) {
        let reporter = Arc::clone(&self.reporter);
        tokio::spawn(async move {
            if let Err(e) = reporter.report(&report).await {
                tracing::warn!(
                    action = %report.action,
                    notification_id = %report.notification_id,
                    error = %e,
                    "Failed to report notification engagement"
                );
            }
        });
    }
}
