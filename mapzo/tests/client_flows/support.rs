pub(crate) use mapzo::gateway::{FixedLocation, MemoryAuth, MemoryGateway, fixtures};
pub(crate) use mapzo::models::Category;
pub(crate) use mapzo::{App, AppError, AuthMode, MapzoConfig, Membership, Route, Sheet, Tab, ViewStatus};

pub(crate) type TestApp = App<MemoryGateway, MemoryAuth, FixedLocation>;

pub(crate) const ANA_EMAIL: &str = "ana@mapzo.test";
pub(crate) const HOST_EMAIL: &str = "riya@mapzo.test";
pub(crate) const PASSWORD: &str = "secret123";

/// Host `h1` with four events, plus the plain users `u1` (Ana) and `u2` (Ben).
pub(crate) fn seeded_gateway() -> MemoryGateway {
    let gateway = MemoryGateway::new();
    gateway.insert_user(fixtures::host_profile("h1", "Riya"));
    gateway.insert_user(fixtures::profile("u1", "Ana"));
    gateway.insert_user(fixtures::profile("u2", "Ben"));
    gateway.insert_event(fixtures::event("e1", "Open Mic", Category::Music, "h1", 1));
    gateway.insert_event(fixtures::event("e2", "Rust Meetup", Category::Tech, "h1", 2));
    gateway.insert_event(fixtures::event("e3", "Jazz Night", Category::Music, "h1", 3));
    gateway.insert_event(fixtures::event("e4", "Food Crawl", Category::Food, "h1", 4));
    gateway
}

pub(crate) fn auth() -> MemoryAuth {
    MemoryAuth::new()
        .with_account(ANA_EMAIL, PASSWORD, fixtures::identity("u1", "Ana"))
        .with_account(HOST_EMAIL, PASSWORD, fixtures::identity("h1", "Riya"))
}

pub(crate) fn app_with(config: MapzoConfig, gateway: MemoryGateway) -> TestApp {
    App::new(config, gateway, auth(), FixedLocation(Some((22.3149, 87.3105))))
}

pub(crate) fn app() -> TestApp {
    app_with(MapzoConfig::default(), seeded_gateway())
}

pub(crate) async fn signed_in(app: &TestApp, email: &str) {
    app.sign_in_email(email, PASSWORD).await.expect("sign in");
}

/// Booted on the map with Ana signed in and the call log cleared.
pub(crate) async fn ana_app() -> TestApp {
    let app = app();
    app.boot("#map").await;
    signed_in(&app, ANA_EMAIL).await;
    app.gateway().clear_calls();
    app
}
