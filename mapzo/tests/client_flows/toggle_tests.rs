use mapzo::TogglePolicy;

use super::support::*;

#[tokio::test]
async fn signed_out_toggles_only_prompt_for_sign_in() {
    let app = app();
    app.boot("#feed").await;
    app.gateway().clear_calls();

    for kind in Membership::ALL {
        let target = if kind == Membership::Follow { "h1" } else { "e1" };
        let err = app.toggle(kind, target).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthenticated));
    }

    assert!(app.gateway().calls().is_empty());
    assert_eq!(app.ui().auth_prompt(), Some(AuthMode::Login));
    assert_eq!(app.ui().last_toast().as_deref(), Some("Please sign in to continue"));
}

#[tokio::test]
async fn tapping_save_while_signed_out_leaves_the_saved_set_alone() {
    let app = app();
    app.boot("#feed").await;

    assert!(app.toggle(Membership::Save, "e2").await.is_err());

    assert_eq!(app.ui().auth_prompt(), Some(AuthMode::Login));
    assert_eq!(app.gateway().call_count("toggle_save"), 0);
    assert!(app.store().read(|state| state.memberships.saved.is_empty()));
    let card = app.views().feed.model().cards.into_iter().find(|c| c.id == "e2").unwrap();
    assert!(!card.saved);
}

#[tokio::test]
async fn double_tap_settles_on_the_second_response() {
    let app = ana_app().await;

    let (first, second) = tokio::join!(app.toggle(Membership::Like, "e1"), app.toggle(Membership::Like, "e1"));

    assert!(first.unwrap());
    assert!(!second.unwrap());
    assert!(!app.store().contains(Membership::Like, "e1"));
    assert!(!app.gateway().has_membership(Membership::Like, "u1", "e1"));
    assert_eq!(app.gateway().call_count("toggle_like"), 2);
    assert_eq!(app.toggles().in_flight(), 0);
}

#[tokio::test]
async fn triple_tap_on_save_ends_saved() {
    let app = ana_app().await;

    let (a, b, c) = tokio::join!(
        app.toggle(Membership::Save, "e2"),
        app.toggle(Membership::Save, "e2"),
        app.toggle(Membership::Save, "e2"),
    );

    assert_eq!((a.unwrap(), b.unwrap(), c.unwrap()), (true, false, true));
    assert!(app.store().contains(Membership::Save, "e2"));
    assert!(app.gateway().has_membership(Membership::Save, "u1", "e2"));
    assert_eq!(app.ui().last_toast().as_deref(), Some("✅ Event saved!"));
}

#[tokio::test]
async fn toggles_on_different_targets_do_not_wait_for_each_other() {
    let app = ana_app().await;

    let (liked, attending) = tokio::join!(app.toggle(Membership::Like, "e1"), app.toggle(Membership::Attend, "e3"));

    assert!(liked.unwrap());
    assert!(attending.unwrap());
    assert!(app.store().contains(Membership::Like, "e1"));
    assert!(app.store().contains(Membership::Attend, "e3"));
}

#[tokio::test]
async fn optimistic_flip_is_visible_before_the_remote_answer() {
    let app = ana_app().await;
    app.navigate("#feed").await;

    let observe = async {
        // Runs while the toggle waits on the remote call.
        let card = app.views().feed.model().cards.into_iter().find(|c| c.id == "e1").unwrap();
        (app.store().contains(Membership::Like, "e1"), card.liked, card.like_count)
    };
    let (result, seen) = tokio::join!(app.toggle(Membership::Like, "e1"), observe);

    assert!(result.unwrap());
    assert_eq!(seen, (true, true, 1));
    assert_eq!(app.gateway().stored_event("e1").unwrap().like_count, 1);
}

#[tokio::test]
async fn failed_toggle_rolls_back_and_shows_the_error() {
    let app = ana_app().await;
    app.navigate("#feed").await;
    app.gateway().fail_next("toggle_attend", "row level security");

    let err = app.toggle(Membership::Attend, "e4").await.unwrap_err();

    assert!(matches!(err, AppError::Remote { .. }));
    assert!(!app.store().contains(Membership::Attend, "e4"));
    let cached = app.store().read(|state| state.event("e4").map(|e| e.attending_count));
    assert_eq!(cached, Some(0));
    let card = app.views().feed.model().cards.into_iter().find(|c| c.id == "e4").unwrap();
    assert!(!card.attending);
    assert_eq!(app.ui().last_toast().as_deref(), Some("Error: row level security"));
}

#[tokio::test]
async fn confirmed_policy_waits_for_the_remote_answer() {
    let mut config = MapzoConfig::default();
    config.sync.toggle_policy = TogglePolicy::Confirmed;
    let app = app_with(config, seeded_gateway());
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    let observe = async { app.store().contains(Membership::Save, "e1") };
    let (result, seen_early) = tokio::join!(app.toggle(Membership::Save, "e1"), observe);

    assert!(result.unwrap());
    assert!(!seen_early);
    assert!(app.store().contains(Membership::Save, "e1"));

    app.gateway().fail_next("toggle_save", "offline");
    assert!(app.toggle(Membership::Save, "e1").await.is_err());
    assert!(app.store().contains(Membership::Save, "e1"));
}

#[tokio::test]
async fn result_from_a_previous_session_is_dropped() {
    let app = ana_app().await;

    let (result, signed_out) = tokio::join!(app.toggle(Membership::Like, "e2"), app.on_auth_change(None));

    signed_out.unwrap();
    assert!(result.unwrap());
    assert!(app.gateway().has_membership(Membership::Like, "u1", "e2"));
    assert!(app.store().read(|state| state.memberships.is_empty()));
}

#[tokio::test]
async fn following_yourself_never_reaches_the_backend() {
    let app = ana_app().await;

    let err = app.toggle(Membership::Follow, "u1").await.unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(app.gateway().call_count("toggle_follow"), 0);
    assert_eq!(app.ui().last_toast().as_deref(), Some("You can't follow yourself"));
}

#[tokio::test]
async fn follow_counts_and_toasts() {
    let app = ana_app().await;

    assert!(app.toggle(Membership::Follow, "h1").await.unwrap());
    assert_eq!(app.ui().last_toast().as_deref(), Some("✅ Following!"));
    assert_eq!(app.gateway().user("h1").unwrap().follower_count, 1);
    assert_eq!(app.gateway().notifications_for("h1").len(), 1);

    assert!(!app.toggle(Membership::Follow, "h1").await.unwrap());
    assert_eq!(app.ui().last_toast().as_deref(), Some("Unfollowed"));
    assert_eq!(app.gateway().user("h1").unwrap().follower_count, 0);
}

#[tokio::test]
async fn free_ticket_joins_and_paid_ticket_only_announces() {
    let gateway = seeded_gateway();
    let mut paid = fixtures::event("e9", "Gala", Category::Party, "h1", 9);
    paid.price = Some("₹499".to_string());
    gateway.insert_event(paid);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    app.buy_ticket("e1").await.unwrap();
    assert!(app.store().contains(Membership::Attend, "e1"));
    assert_eq!(app.ui().last_toast().as_deref(), Some("✅ RSVP confirmed!"));

    app.buy_ticket("e9").await.unwrap();
    assert!(!app.store().contains(Membership::Attend, "e9"));
    assert_eq!(app.ui().last_toast().as_deref(), Some("💳 Ticket payments coming soon!"));
}
