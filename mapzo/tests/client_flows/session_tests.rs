use super::support::*;

fn ana_memberships(gateway: &MemoryGateway) {
    gateway.insert_membership(Membership::Like, "u1", "e1");
    gateway.insert_membership(Membership::Save, "u1", "e2");
    gateway.insert_membership(Membership::Attend, "u1", "e3");
    gateway.insert_membership(Membership::Follow, "u1", "h1");
    gateway.push_notification("u1", "h1", "Riya liked your comment");
}

#[tokio::test]
async fn sign_in_loads_profile_sets_and_badge() {
    let gateway = seeded_gateway();
    ana_memberships(&gateway);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    app.ui().open_auth(AuthMode::Login);

    let identity = app.sign_in_email(ANA_EMAIL, PASSWORD).await.unwrap();

    assert_eq!(identity.uid, "u1");
    app.store().read(|state| {
        let sets = &state.memberships;
        assert!(sets.liked.contains("e1"));
        assert!(sets.saved.contains("e2"));
        assert!(sets.attending.contains("e3"));
        assert!(sets.following.contains("h1"));
        assert_eq!(state.unread_notifications, 1);
        assert_eq!(state.session.as_ref().map(|s| s.display_name()), Some("Ana"));
    });
    assert_eq!(app.ui().badge(), "1");
    assert_eq!(app.ui().auth_prompt(), None);
    assert_eq!(app.ui().last_toast().as_deref(), Some("👋 Welcome, Ana!"));
    assert!(app.has_notification_channel());
}

#[tokio::test]
async fn sign_out_clears_everything_and_sign_in_restores_it() {
    let gateway = seeded_gateway();
    ana_memberships(&gateway);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    app.sign_out().await.unwrap();

    app.store().read(|state| {
        assert!(state.session.is_none());
        assert!(state.memberships.is_empty());
        assert_eq!(state.unread_notifications, 0);
    });
    assert_eq!(app.ui().badge(), "");
    assert!(!app.has_notification_channel());
    assert_eq!(app.gateway().active_subscriptions("notifs-u1"), 0);
    assert_eq!(app.ui().last_toast().as_deref(), Some("Signed out"));

    signed_in(&app, ANA_EMAIL).await;
    app.store().read(|state| {
        assert!(state.memberships.liked.contains("e1"));
        assert!(state.memberships.following.contains("h1"));
    });
    assert_eq!(app.gateway().active_subscriptions("notifs-u1"), 1);
}

#[tokio::test]
async fn no_reader_sees_a_half_loaded_session() {
    let gateway = seeded_gateway();
    ana_memberships(&gateway);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;

    let probe = async {
        let mut seen = Vec::new();
        for _ in 0..64 {
            seen.push(app.store().read(|state| {
                (
                    state.is_signed_in(),
                    state.memberships.liked.len() + state.memberships.following.len(),
                    state.unread_notifications,
                )
            }));
            tokio::task::yield_now().await;
        }
        seen
    };
    let (signed_in, seen) = tokio::join!(app.sign_in_email(ANA_EMAIL, PASSWORD), probe);

    signed_in.unwrap();
    assert!(seen.contains(&(false, 0, 0)));
    assert!(seen.contains(&(true, 2, 1)));
    for observation in seen {
        assert!(
            observation == (false, 0, 0) || observation == (true, 2, 1),
            "partial session observed: {observation:?}"
        );
    }
}

#[tokio::test]
async fn first_sign_up_creates_the_profile_row() {
    let app = app();
    app.boot("#profile").await;

    let identity = app.sign_up_email("  Chandra ", "chandra@mapzo.test", "hunter22").await.unwrap();

    let profile = app.gateway().user(&identity.uid).expect("profile row");
    assert_eq!(profile.display_name.as_deref(), Some("Chandra"));
    assert_eq!(app.ui().last_toast().as_deref(), Some("👋 Welcome, Chandra!"));
    assert!(matches!(
        app.views().profile.model().state,
        mapzo::views::profile::ProfileState::Ready(_)
    ));
}

#[tokio::test]
async fn auth_failures_stay_inline() {
    let app = app();
    app.boot("#map").await;
    app.ui().open_auth(AuthMode::Login);

    assert!(app.sign_in_email("", "").await.is_err());
    assert_eq!(app.ui().auth_error().as_deref(), Some("Please fill all fields"));
    assert!(app.auth().calls().is_empty());

    assert!(app.sign_in_email(ANA_EMAIL, "wrong-password").await.is_err());
    assert_eq!(app.ui().auth_error().as_deref(), Some("Error: Invalid email or password"));

    assert!(app.sign_up_email("Dev", "dev@mapzo.test", "123").await.is_err());
    assert_eq!(
        app.ui().auth_error().as_deref(),
        Some("Password must be at least 6 characters")
    );
    assert!(app.sign_up_email("Dev", "not-an-email", "123456").await.is_err());
    assert_eq!(app.ui().auth_error().as_deref(), Some("Please enter a valid email"));

    assert!(app.sign_in_federated().await.is_err());
    assert_eq!(app.ui().auth_prompt(), Some(AuthMode::Login));
    assert!(!app.store().read(|state| state.is_signed_in()));
}

#[tokio::test]
async fn boot_restores_a_remembered_session() {
    let auth = MemoryAuth::new().with_current(fixtures::identity("u1", "Ana"));
    let app = App::new(MapzoConfig::default(), seeded_gateway(), auth, FixedLocation(None));

    let activation = app.boot("#social").await;

    assert_eq!(activation.route, Route::Social);
    assert_eq!(app.store().identity().map(|i| i.uid), Some("u1".to_string()));
    assert_eq!(app.gateway().active_subscriptions("events-channel"), 1);
    assert_eq!(
        app.views().social.state(),
        mapzo::views::social::SocialState::FollowPeople
    );
}

#[tokio::test]
async fn signing_out_resets_the_social_and_profile_views() {
    let app = ana_app().await;
    app.navigate("#profile").await;
    assert!(matches!(
        app.views().profile.model().state,
        mapzo::views::profile::ProfileState::Ready(_)
    ));

    app.sign_out().await.unwrap();

    assert_eq!(
        app.views().profile.model().state,
        mapzo::views::profile::ProfileState::SignedOut
    );
    assert_eq!(app.route_status(Route::Social), ViewStatus::Uninitialized);
}

#[tokio::test]
async fn profile_load_racing_sign_out_stays_signed_out() {
    let gateway = seeded_gateway();
    ana_memberships(&gateway);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    let (_, signed_out) = tokio::join!(app.navigate("#profile"), app.sign_out());
    signed_out.unwrap();

    assert!(app.store().read(|state| state.session.is_none()));
    let model = app.views().profile.model();
    assert_eq!(model.state, mapzo::views::profile::ProfileState::SignedOut);
    assert!(model.hosted.is_empty());
    assert!(model.saved.is_empty());
    assert!(model.notifications.is_empty());
    assert_eq!(app.ui().badge(), "");
}

#[tokio::test]
async fn social_load_racing_sign_out_stays_signed_out() {
    let gateway = seeded_gateway();
    ana_memberships(&gateway);
    let app = app_with(MapzoConfig::default(), gateway);
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;

    let (_, signed_out) = tokio::join!(app.navigate("#social"), app.sign_out());
    signed_out.unwrap();

    assert_eq!(app.views().social.state(), mapzo::views::social::SocialState::SignedOut);
}
