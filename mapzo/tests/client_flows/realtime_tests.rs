use chrono::{NaiveDate, NaiveTime};
use mapzo::Gateway;
use mapzo::models::NewEvent;

use super::support::*;

fn new_event(title: &str) -> NewEvent {
    NewEvent {
        title: title.to_string(),
        category: Category::Nightlife,
        event_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        start_time: NaiveTime::from_hms_opt(22, 0, 0).unwrap(),
        end_time: None,
        venue_name: "Tikka Terrace".to_string(),
        address: "Tikka Terrace".to_string(),
        lat: 22.319,
        lng: 87.309,
        price: String::new(),
        description: String::new(),
        tags: Vec::new(),
        image_urls: Vec::new(),
        video_urls: Vec::new(),
    }
}

#[tokio::test]
async fn only_the_latest_sheet_keeps_a_comment_channel() {
    let app = ana_app().await;

    app.open_event("e1").await.unwrap();
    assert_eq!(app.gateway().active_subscriptions("comments-e1"), 1);

    app.open_event("e2").await.unwrap();
    assert_eq!(app.gateway().active_subscriptions("comments-e1"), 0);
    assert_eq!(app.gateway().active_subscriptions("comments-e2"), 1);
    assert_eq!(app.gateway().active_subscriptions_with_prefix("comments-"), 1);

    app.close_event();
    assert_eq!(app.gateway().active_subscriptions_with_prefix("comments-"), 0);
    assert!(!app.has_comment_channel());
    assert_eq!(app.ui().sheet(), None);
}

#[tokio::test]
async fn racing_opens_leave_one_channel_for_the_last_event() {
    let app = ana_app().await;

    let (a, b) = tokio::join!(app.open_event("e1"), app.open_event("e2"));

    a.unwrap();
    b.unwrap();
    assert_eq!(app.views().sheet.event_id().as_deref(), Some("e2"));
    assert_eq!(app.gateway().active_subscriptions_with_prefix("comments-"), 1);
    assert_eq!(app.gateway().active_subscriptions("comments-e2"), 1);
}

#[tokio::test]
async fn closing_while_loading_opens_no_channel() {
    let app = ana_app().await;

    let close_soon = async { app.close_event() };
    let (opened, ()) = tokio::join!(app.open_event("e3"), close_soon);

    opened.unwrap();
    assert!(app.views().sheet.event_id().is_none());
    assert_eq!(app.gateway().active_subscriptions_with_prefix("comments-"), 0);
}

#[tokio::test]
async fn navigating_away_tears_the_comment_channel_down() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();

    app.navigate("#explore").await;

    assert!(!app.has_comment_channel());
    assert_eq!(app.gateway().active_subscriptions("comments-e1"), 0);
}

#[tokio::test]
async fn pushed_comments_are_prepended_once() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();

    let ben = fixtures::identity("u2", "Ben");
    let pushed = app.gateway().add_comment(&ben, "e1", "See you there", None).await.unwrap();
    assert_eq!(app.pump_realtime(), 1);

    // The echo of our own comment arrives after it was already shown.
    let own = app.submit_comment("Me too!", Some(4)).await.unwrap();
    assert_eq!(app.pump_realtime(), 1);

    let comments = app.views().sheet.detail().unwrap().comments;
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, own.id);
    assert!(comments[0].own);
    assert_eq!(comments[0].stars.as_deref(), Some("★★★★☆"));
    assert_eq!(comments[1].id, pushed.id);
    assert_eq!(comments[1].author_name, "Ben");
    assert!(!comments[1].own);
}

#[tokio::test]
async fn comments_for_a_closed_sheet_are_ignored() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();
    app.close_event();

    let ben = fixtures::identity("u2", "Ben");
    app.gateway().add_comment(&ben, "e1", "Anyone?", None).await.unwrap();

    assert_eq!(app.pump_realtime(), 0);
}

#[tokio::test]
async fn notifications_bump_the_badge_and_toast() {
    let app = ana_app().await;
    let ben = fixtures::identity("u2", "Ben");

    app.gateway().toggle(&ben, Membership::Follow, "u1").await.unwrap();
    assert_eq!(app.pump_realtime(), 1);

    assert_eq!(app.store().read(|state| state.unread_notifications), 1);
    assert_eq!(app.ui().badge(), "1");
    assert_eq!(app.ui().last_toast().as_deref(), Some("🔔 Ben started following you"));

    for n in 0..10 {
        app.gateway().push_notification("u1", "u2", &format!("ping {n}"));
    }
    app.pump_realtime();
    assert_eq!(app.ui().badge(), "9+");
}

#[tokio::test]
async fn new_events_become_pins_on_a_ready_map() {
    let app = ana_app().await;
    let pins_before = app.views().map.model().pins.len();

    let host = fixtures::identity("h1", "Riya");
    let created = app.gateway().create_event(&host, new_event("NYE Rooftop")).await.unwrap();
    assert_eq!(app.pump_realtime(), 1);

    let model = app.views().map.model();
    assert_eq!(model.pins.len(), pins_before + 1);
    assert!(model.pins.iter().any(|pin| pin.event_id == created.id));
    let newest = app.store().read(|state| state.events.first().map(|e| e.id.clone()));
    assert_eq!(newest, Some(created.id));
}

#[tokio::test]
async fn new_events_wait_in_the_cache_until_the_map_is_shown() {
    let app = app();
    app.boot("#feed").await;

    let host = fixtures::identity("h1", "Riya");
    let created = app.gateway().create_event(&host, new_event("Silent Disco")).await.unwrap();
    app.pump_realtime();

    assert!(app.views().map.model().pins.is_empty());
    assert!(app.store().read(|state| state.event(&created.id).is_some()));

    app.navigate("#map").await;
    assert!(app.views().map.model().pins.iter().any(|pin| pin.event_id == created.id));
}

#[tokio::test]
async fn shutdown_closes_every_channel() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();

    app.shutdown();

    assert_eq!(app.gateway().active_subscriptions("events-channel"), 0);
    assert_eq!(app.gateway().active_subscriptions("notifs-u1"), 0);
    assert_eq!(app.gateway().active_subscriptions_with_prefix("comments-"), 0);
}
