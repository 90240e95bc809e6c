//! Click and close handling through the service facade.

mod common;

use chapel_core::engagement::{TransportEvent, TransportEventKind};
use chapel_core::notification::{NotificationCategory, NotificationData};
use chapel_events::EngagementEffect;
use common::*;

fn click(action: &str, data: NotificationData) -> TransportEvent {
    TransportEvent {
        kind: TransportEventKind::Click,
        action: Some(action.into()),
        data,
    }
}

#[tokio::test]
async fn saved_items_accumulate_in_order() {
    let h = harness(local(2026, 6, 1, 12, 0));
    for id in ["d-1", "d-2"] {
        let data = NotificationData::new(id, NotificationCategory::Devotion, format!("/devotions/{id}"));
        assert!(matches!(
            h.service.handle_event(click("save", data)).await,
            EngagementEffect::Saved(_)
        ));
    }

    let saved = h.service.saved_items().await;
    let ids: Vec<_> = saved.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["d-1", "d-2"]);
    assert_eq!(saved[0].saved_at, local(2026, 6, 1, 12, 0));
}

#[tokio::test]
async fn view_navigates_to_notification_url() {
    let h = harness(local(2026, 6, 1, 12, 0));
    let data = NotificationData::new("g-1", NotificationCategory::Community, "/groups/g-1");
    assert_eq!(
        h.service.handle_event(click("view", data)).await,
        EngagementEffect::Navigate("/groups/g-1".into())
    );
}
