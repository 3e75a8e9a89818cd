use chrono::{NaiveDate, NaiveTime};
use mapzo::gateway::memory::PendingLocation;
use mapzo::models::{EventDraft, HostRequest, MediaUpload};
use mapzo::views::host::HostMode;
use mapzo::views::profile::{ProfileEdit, ProfileState};
use mapzo::views::social::SocialState;

use super::support::*;

fn draft(title: &str) -> EventDraft {
    EventDraft {
        title: title.to_string(),
        category: Some(Category::Music),
        event_date: NaiveDate::from_ymd_opt(2026, 11, 20),
        start_time: NaiveTime::from_hms_opt(20, 30, 0),
        venue: "  Vikramshila Grounds ".to_string(),
        lat: Some(22.3201),
        lng: Some(87.3102),
        tags: "music, #live,, ".to_string(),
        ..Default::default()
    }
}

fn upload(file_name: &str, len: usize) -> MediaUpload {
    MediaUpload {
        file_name: file_name.to_string(),
        bytes: vec![0; len],
    }
}

// ---------------------------------------------------------------------
// Social
// ---------------------------------------------------------------------

#[tokio::test]
async fn social_without_follows_shows_the_empty_state_and_skips_the_query() {
    let app = ana_app().await;

    app.navigate("#social").await;

    assert_eq!(app.views().social.state(), SocialState::FollowPeople);
    assert_eq!(app.gateway().call_count("get_activity_feed"), 0);
}

#[tokio::test]
async fn social_lists_what_followed_people_attend() {
    let gateway = seeded_gateway();
    gateway.insert_membership(Membership::Follow, "u1", "u2");
    gateway.insert_membership(Membership::Attend, "u2", "e3");
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#social").await;
    assert_eq!(app.views().social.state(), SocialState::SignedOut);

    signed_in(&app, ANA_EMAIL).await;

    let SocialState::Activity(entries) = app.views().social.state() else {
        panic!("expected activity, got {:?}", app.views().social.state());
    };
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_name, "Ben");
    assert_eq!(entries[0].event_title, "Jazz Night");
    assert_eq!(app.gateway().call_count("get_activity_feed"), 1);
}

// ---------------------------------------------------------------------
// Feed and list
// ---------------------------------------------------------------------

#[tokio::test]
async fn feed_pages_until_a_short_page() {
    let mut config = MapzoConfig::default();
    config.app.feed_page_size = 2;
    let gateway = seeded_gateway();
    gateway.insert_event(fixtures::event("e5", "Chess Open", Category::Sports, "h1", 5));
    let app = app_with(config, gateway);

    app.navigate("#feed").await;
    assert_eq!(app.views().feed.model().cards.len(), 2);
    assert_eq!(app.views().feed.model().cards[0].id, "e5");

    assert_eq!(app.load_more_feed().await.unwrap(), 2);
    assert_eq!(app.load_more_feed().await.unwrap(), 1);
    let model = app.views().feed.model();
    assert!(model.all_loaded);
    assert_eq!(model.offset, 5);

    let calls = app.gateway().call_count("get_events");
    assert_eq!(app.load_more_feed().await.unwrap(), 0);
    assert_eq!(app.gateway().call_count("get_events"), calls);
}

#[tokio::test]
async fn overlapping_scroll_loads_fetch_one_page() {
    let mut config = MapzoConfig::default();
    config.app.feed_page_size = 1;
    let app = app_with(config, seeded_gateway());
    app.navigate("#feed").await;

    let (a, b) = tokio::join!(app.load_more_feed(), app.load_more_feed());

    assert_eq!(a.unwrap() + b.unwrap(), 1);
    assert_eq!(app.views().feed.model().cards.len(), 2);
}

#[tokio::test]
async fn empty_backend_gives_the_empty_feed() {
    let app = app_with(MapzoConfig::default(), MemoryGateway::new());
    app.navigate("#feed").await;
    let model = app.views().feed.model();
    assert!(model.empty);
    assert!(model.cards.is_empty());
}

#[tokio::test]
async fn browsing_a_category_filters_the_list() {
    let app = app();
    app.boot("#explore").await;

    let activation = app.browse_category(Category::Music).await;

    assert_eq!(activation.route, Route::List);
    assert!(activation.run_initializer);
    let rows = app.views().list.model().rows;
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|row| row.category == Category::Music));
    assert_eq!(app.ui().last_toast().as_deref(), Some("🎵 Browsing Music"));
}

#[tokio::test]
async fn explore_ranks_trending_events() {
    let app = app();
    app.navigate("#explore").await;

    let model = app.views().explore.model();
    assert_eq!(model.trending.len(), 4);
    assert_eq!(model.trending[0].rank, 1);
    assert_eq!(model.trending[0].event_id, "e4");
    let music = model
        .categories
        .iter()
        .find(|tile| tile.category == Category::Music)
        .unwrap();
    assert_eq!(music.event_count, 2);
}

// ---------------------------------------------------------------------
// Map
// ---------------------------------------------------------------------

#[tokio::test]
async fn map_filter_and_preview() {
    let app = app();
    app.boot("#map").await;
    let model = app.views().map.model();
    assert!(model.located);
    assert_eq!(model.pins.len(), 4);

    assert_eq!(app.filter_map("Music"), 2);
    assert_eq!(app.filter_map("All"), 4);

    app.preview_pin("e2").unwrap();
    let preview = app.views().map.model().preview.unwrap();
    assert_eq!(preview.title, "Rust Meetup");
    assert_eq!(preview.price, "Free");
    assert!(matches!(app.preview_pin("missing"), Err(AppError::NotFound { .. })));
}

#[tokio::test(start_paused = true)]
async fn slow_geolocation_falls_back_to_the_default_centre() {
    let config = MapzoConfig::default();
    let centre = (config.app.default_lat, config.app.default_lng);
    let app = App::new(config, seeded_gateway(), auth(), PendingLocation);

    app.boot("#map").await;

    let model = app.views().map.model();
    assert!(!model.located);
    assert_eq!(model.center, centre);
    assert_eq!(model.pins.len(), 4);
}

// ---------------------------------------------------------------------
// Event sheet
// ---------------------------------------------------------------------

#[tokio::test]
async fn sheet_shows_attendees_friends_and_related_events() {
    let gateway = seeded_gateway();
    for i in 0..7 {
        let id = format!("a{i}");
        gateway.insert_user(fixtures::profile(&id, &format!("Guest {i}")));
        gateway.insert_membership(Membership::Attend, &id, "e1");
    }
    gateway.insert_membership(Membership::Attend, "u2", "e1");
    gateway.insert_membership(Membership::Follow, "u1", "u2");
    gateway.insert_membership(Membership::Save, "u1", "e1");
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    app.open_event("e1").await.unwrap();

    let detail = app.views().sheet.detail().unwrap();
    assert_eq!(detail.attendees.len(), 5);
    assert_eq!(detail.more_attendees, 3);
    assert_eq!(detail.friends_attending.len(), 1);
    assert_eq!(detail.friends_attending[0].id, "u2");
    assert!(detail.saved);
    assert!(!detail.following_host);
    assert_eq!(detail.related.len(), 1);
    assert_eq!(detail.related[0].id, "e3");
    assert!(app.ui().is_scroll_locked());
}

#[tokio::test]
async fn missing_event_closes_the_sheet() {
    let app = ana_app().await;

    let err = app.open_event("nope").await.unwrap_err();

    assert!(matches!(err, AppError::NotFound { .. }));
    assert_eq!(app.ui().sheet(), None);
    assert!(app.views().sheet.event_id().is_none());
    assert_eq!(app.ui().last_toast().as_deref(), Some("Failed to load event"));
}

#[tokio::test]
async fn comment_input_is_checked_before_sending() {
    let app = ana_app().await;
    app.open_event("e2").await.unwrap();

    assert!(app.submit_comment("   ", None).await.is_err());
    assert_eq!(app.ui().form_error("comment").as_deref(), Some("Write something first!"));
    assert!(app.submit_comment("Nice", Some(6)).await.is_err());
    assert_eq!(app.gateway().call_count("add_comment"), 0);

    app.submit_comment("  Nice  ", Some(5)).await.unwrap();
    assert_eq!(app.ui().form_error("comment"), None);
    assert_eq!(app.views().sheet.detail().unwrap().comments[0].text, "Nice");
}

#[tokio::test]
async fn comment_is_removed_only_after_the_remote_delete() {
    let app = ana_app().await;
    app.open_event("e2").await.unwrap();
    let comment = app.submit_comment("Typo", None).await.unwrap();

    app.gateway().fail_next("delete_comment", "timeout");
    assert!(app.delete_comment(&comment.id).await.is_err());
    assert_eq!(app.views().sheet.detail().unwrap().comments.len(), 1);

    app.delete_comment(&comment.id).await.unwrap();
    assert!(app.views().sheet.detail().unwrap().comments.is_empty());
    assert_eq!(app.ui().last_toast().as_deref(), Some("Comment deleted"));
}

#[tokio::test]
async fn share_and_directions_links() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();

    assert_eq!(app.share_event("e1").unwrap(), "https://mapzo.app/#event-e1");
    assert_eq!(app.ui().last_toast().as_deref(), Some("🔗 Link copied!"));
    assert_eq!(app.directions("e1").unwrap(), "https://maps.google.com/?q=22.3149,87.3105");
}

#[tokio::test]
async fn sheet_affordances_follow_toggles() {
    let app = ana_app().await;
    app.open_event("e1").await.unwrap();

    app.toggle(Membership::Like, "e1").await.unwrap();
    app.toggle(Membership::Follow, "h1").await.unwrap();

    let detail = app.views().sheet.detail().unwrap();
    assert!(detail.liked);
    assert_eq!(detail.like_count, 1);
    assert!(detail.following_host);
}

// ---------------------------------------------------------------------
// Hosting
// ---------------------------------------------------------------------

#[tokio::test]
async fn non_hosts_get_the_verification_flow() {
    let app = ana_app().await;

    assert_eq!(app.open_host().unwrap(), HostMode::Verify);
    assert_eq!(app.ui().sheet(), Some(Sheet::HostRequest));

    let mut request = HostRequest {
        full_name: "Ana Roy".to_string(),
        org: "Music Club".to_string(),
        email: "not-an-email".to_string(),
        reason: "Weekly jams".to_string(),
    };
    assert!(app.submit_host_request(&request).await.is_err());
    assert_eq!(app.ui().form_error("host_request").as_deref(), Some("Please enter a valid email"));
    assert!(app.gateway().host_requests().is_empty());

    request.email = " ana@club.test ".to_string();
    app.submit_host_request(&request).await.unwrap();
    let stored = app.gateway().host_requests();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].0, "u1");
    assert_eq!(stored[0].1.email, "ana@club.test");
    assert_eq!(app.ui().sheet(), None);

    let err = app.publish_event(draft("Jam")).await.unwrap_err();
    assert_eq!(err.user_message(), "Only verified hosts can publish events");
    assert_eq!(app.gateway().call_count("create_event"), 0);
}

#[tokio::test]
async fn signed_out_host_button_prompts_for_sign_in() {
    let app = app();
    assert!(matches!(app.open_host(), Err(AppError::Unauthenticated)));
    assert_eq!(app.ui().auth_prompt(), Some(AuthMode::Login));
}

#[tokio::test]
async fn host_publishes_with_media_and_tags() {
    let app = app();
    app.boot("#map").await;
    app.navigate("#feed").await;
    app.navigate("#map").await;
    signed_in(&app, HOST_EMAIL).await;
    assert_eq!(app.open_host().unwrap(), HostMode::Create);

    let mut input = draft("  Indie Night ");
    input.media = vec![upload("poster.jpg", 2048), upload("teaser.MOV", 4096)];
    let event = app.publish_event(input).await.unwrap();

    assert_eq!(event.title, "Indie Night");
    assert_eq!(event.venue_name.as_deref(), Some("Vikramshila Grounds"));
    assert_eq!(event.tags, vec!["#music".to_string(), "#live".to_string()]);
    assert_eq!(event.image_urls.len(), 1);
    assert_eq!(event.video_urls.len(), 1);
    assert!(event.video_urls[0].starts_with("memory://"));
    assert_eq!(app.gateway().stored_paths().len(), 2);

    assert!(app.views().map.model().pins.iter().any(|pin| pin.event_id == event.id));
    assert_eq!(app.route_status(Route::Feed), ViewStatus::Stale);
    assert_eq!(app.ui().last_toast().as_deref(), Some("🎉 Event published!"));
    assert_eq!(app.ui().sheet(), None);
    let newest = app.store().read(|state| state.events.first().map(|e| e.id.clone()));
    assert_eq!(newest, Some(event.id));
}

#[tokio::test]
async fn publish_checks_fields_in_order_and_upload_size() {
    let mut config = MapzoConfig::default();
    config.app.max_upload_size_mb = 1;
    let app = app_with(config, seeded_gateway());
    app.boot("#map").await;
    signed_in(&app, HOST_EMAIL).await;

    let mut missing = draft("");
    missing.venue = String::new();
    assert!(app.publish_event(missing).await.is_err());
    assert_eq!(app.ui().form_error("create_event").as_deref(), Some("Event title is required"));

    let mut unplaced = draft("Jam");
    unplaced.lat = None;
    assert!(app.publish_event(unplaced).await.is_err());
    assert_eq!(
        app.ui().form_error("create_event").as_deref(),
        Some("Please tap the map to set the exact location")
    );

    let mut heavy = draft("Jam");
    heavy.media = vec![upload("huge.png", 2 * 1024 * 1024)];
    assert!(app.publish_event(heavy).await.is_err());
    assert_eq!(app.gateway().call_count("upload_event_media"), 0);
    assert_eq!(app.gateway().call_count("create_event"), 0);
}

// ---------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------

#[tokio::test]
async fn profile_marks_notifications_read() {
    let gateway = seeded_gateway();
    gateway.insert_membership(Membership::Save, "u1", "e2");
    gateway.push_notification("u1", "u2", "Ben started following you");
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;
    assert_eq!(app.ui().badge(), "1");

    app.navigate("#profile").await;

    let model = app.views().profile.model();
    assert!(matches!(model.state, ProfileState::Ready(ref summary) if summary.display_name == "Ana"));
    assert_eq!(model.notifications.len(), 1);
    assert_eq!(model.saved.len(), 1);
    assert_eq!(model.saved[0].id, "e2");
    assert_eq!(model.share_url.as_deref(), Some("https://mapzo.app/#profile"));
    assert_eq!(app.ui().badge(), "");
    assert_eq!(app.store().read(|state| state.unread_notifications), 0);
    assert!(app.gateway().notifications_for("u1").iter().all(|n| n.read));

    app.toggle(Membership::Save, "e2").await.unwrap();
    assert!(app.views().profile.model().saved.is_empty());
}

#[tokio::test]
async fn saving_the_profile_uploads_the_avatar_and_refreshes() {
    let app = ana_app().await;
    app.navigate("#profile").await;
    app.open_edit_profile().unwrap();

    let edit = ProfileEdit {
        display_name: "Ana R".to_string(),
        bio: "Gigs and chai".to_string(),
        instagram: "@ana.r".to_string(),
        interests: "music, tech".to_string(),
        avatar: Some(upload("me.png", 512)),
    };
    let profile = app.save_profile(edit).await.unwrap();

    assert_eq!(profile.instagram.as_deref(), Some("ana.r"));
    assert!(profile.avatar_url.is_some());
    assert_eq!(app.gateway().user("u1").unwrap().display_name.as_deref(), Some("Ana R"));
    assert_eq!(app.ui().last_toast().as_deref(), Some("✅ Profile updated!"));
    assert_eq!(app.ui().sheet(), None);
    assert!(matches!(
        app.views().profile.model().state,
        ProfileState::Ready(ref summary) if summary.display_name == "Ana R"
    ));

    let blank = ProfileEdit::default();
    assert!(app.save_profile(blank).await.is_err());
    assert_eq!(app.ui().form_error("profile").as_deref(), Some("Name can't be empty"));
}

#[tokio::test]
async fn user_sheet_tracks_the_follow_button() {
    let app = ana_app().await;

    app.open_user("h1").await.unwrap();
    let sheet = app.views().profile.model().user_sheet.unwrap();
    assert_eq!(sheet.hosted.len(), 4);
    assert!(!sheet.following);
    assert!(!sheet.is_self);

    app.toggle(Membership::Follow, "h1").await.unwrap();
    let sheet = app.views().profile.model().user_sheet.unwrap();
    assert!(sheet.following);
    assert_eq!(sheet.summary.follower_count, 1);

    app.close_user();
    assert!(app.views().profile.model().user_sheet.is_none());
    assert_eq!(app.ui().sheet(), None);
}
