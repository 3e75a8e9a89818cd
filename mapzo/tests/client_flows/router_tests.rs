use super::support::*;

#[tokio::test]
async fn unknown_fragments_show_the_default_route() {
    let app = app();
    for fragment in ["#nowhere", "#event-e1", "settings", "#MAP"] {
        let activation = app.navigate(fragment).await;
        assert_eq!(activation.route, Route::Map, "{fragment}");
        assert_eq!(activation.redirected_from.as_deref(), Some(fragment));
        assert_eq!(app.active_route(), Some(Route::Map));
        assert!(app.ui().panes().is_visible(Route::Map));
    }
}

#[tokio::test]
async fn empty_fragment_is_the_map_without_a_redirect() {
    let app = app();
    let activation = app.boot("").await;
    assert_eq!(activation.route, Route::Map);
    assert_eq!(activation.redirected_from, None);
    assert!(activation.show_view_switcher);
}

#[tokio::test]
async fn initializer_runs_once_until_invalidated() {
    let app = app();
    let first = app.navigate("#feed").await;
    assert!(first.run_initializer);
    assert_eq!(app.gateway().call_count("get_events"), 1);

    app.navigate("#explore").await;
    let explore_calls = app.gateway().call_count("get_events");
    let again = app.navigate("#feed").await;
    assert!(!again.run_initializer);
    app.navigate("feed").await;
    assert_eq!(app.gateway().call_count("get_events"), explore_calls);
    assert_eq!(app.route_status(Route::Feed), ViewStatus::Ready);

    let refreshed = app.refresh(Route::Feed).await.expect("feed is active");
    assert!(refreshed.run_initializer);
    assert_eq!(app.gateway().call_count("get_events"), explore_calls + 1);

    let settled = app.navigate("#feed").await;
    assert!(!settled.run_initializer);
    assert_eq!(app.gateway().call_count("get_events"), explore_calls + 1);
}

#[tokio::test]
async fn invalidating_an_inactive_route_reruns_it_on_next_visit() {
    let app = app();
    app.navigate("#list").await;
    app.navigate("#explore").await;
    assert!(app.refresh(Route::List).await.is_none());
    assert_eq!(app.route_status(Route::List), ViewStatus::Stale);

    let back = app.navigate("#list").await;
    assert!(back.run_initializer);
    assert_eq!(app.route_status(Route::List), ViewStatus::Ready);
}

#[tokio::test]
async fn discover_tab_returns_to_the_last_sub_view() {
    let app = app();
    app.navigate("#list").await;
    app.navigate_tab(Tab::Social).await;
    assert!(!app.ui().panes().view_switcher);

    let back = app.navigate_tab(Tab::Discover).await;
    assert_eq!(back.route, Route::List);
    assert_eq!(app.ui().panes().active_tab, Tab::Discover);
    app.store().read(|state| {
        assert_eq!(state.route.current_view, Route::List);
        assert_eq!(state.route.current_tab, Tab::Discover);
    });
}

#[tokio::test]
async fn activation_resets_the_pane_scroll() {
    let app = app();
    app.navigate("#feed").await;
    app.ui().set_scroll(Route::Feed, 480);
    app.navigate("#explore").await;
    app.navigate("#feed").await;
    assert_eq!(app.ui().panes().scroll_offset(Route::Feed), 0);
}

#[tokio::test]
async fn failed_initializer_keeps_its_error_without_retrying() {
    let app = app();
    app.gateway().fail_next("get_events", "connection reset");
    app.navigate("#feed").await;
    let model = app.views().feed.model();
    assert_eq!(model.error.as_deref(), Some("Couldn't load events"));

    app.navigate("#explore").await;
    let calls = app.gateway().call_count("get_events");
    app.navigate("#feed").await;
    assert_eq!(app.gateway().call_count("get_events"), calls);
}
