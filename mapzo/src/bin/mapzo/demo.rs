use anyhow::{Context, Result};
use clap::Args;

use mapzo::gateway::{FixedLocation, MemoryAuth, MemoryGateway, fixtures};
use mapzo::models::Category;
use mapzo::{App, MapzoConfig, Membership, Route};

use crate::output::OutputManager;
use crate::theme::ICONS;

const DEMO_EMAIL: &str = "ana@mapzo.test";
const DEMO_PASSWORD: &str = "mapzo-demo";

const TITLES: &[&str] = &[
    "Open Mic Night",
    "Rooftop Party",
    "Rust Meetup",
    "Street Food Crawl",
    "Five-a-side Cup",
    "Dandiya Evening",
    "Late Night Jazz",
    "Flea Market",
    "Sunrise Yoga",
];

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Varies the seeded events between runs
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Number of events to seed
    #[arg(long, default_value_t = 12)]
    pub events: usize,
}

pub const EXAMPLES: &[&str] = &["mapzo demo", "mapzo demo --seed 42 --events 20", "mapzo --no-color demo"];

fn seed_backend(args: &DemoArgs) -> MemoryGateway {
    let gateway = MemoryGateway::new();
    gateway.insert_user(fixtures::host_profile("h1", "Riya"));
    gateway.insert_user(fixtures::profile("u1", "Ana"));

    for i in 0..args.events {
        let mix = args.seed.wrapping_add(i as u64);
        let slot = (mix % TITLES.len() as u64) as usize;
        let category = Category::KNOWN[slot % Category::KNOWN.len()].clone();
        let mut event = fixtures::event(&format!("e{i}"), TITLES[slot], category, "h1", i as i64 * 15);
        event.attending_count = (mix.wrapping_mul(37) % 140) as i64;
        event.like_count = (mix.wrapping_mul(13) % 60) as i64;
        event.is_live = i % 5 == 0;
        event.is_pinned = i == 0;
        event.lat += (slot as f64 - 4.0) * 0.002;
        event.lng += (i as f64 % 3.0 - 1.0) * 0.002;
        gateway.insert_event(event);
    }
    gateway
}

/// Runs a scripted session against the in-memory backend.
pub async fn handle_demo(args: DemoArgs, config: MapzoConfig, output: &OutputManager) -> Result<()> {
    let centre = (config.app.default_lat, config.app.default_lng);
    let auth = MemoryAuth::new().with_account(DEMO_EMAIL, DEMO_PASSWORD, fixtures::identity("u1", "Ana"));
    let app = App::new(config, seed_backend(&args), auth, FixedLocation(Some(centre)));

    output.heading("Mapzo demo");
    let activation = app.boot(&Route::Map.fragment()).await;
    output.info(&format!("booted on {}", activation.route.fragment()));
    output.bullet(&format!("{} {} pins on the map", ICONS.pin, app.views().map.model().pins.len()));

    app.sign_in_email(DEMO_EMAIL, DEMO_PASSWORD)
        .await
        .context("demo sign-in failed")?;
    output.success(&app.ui().last_toast().unwrap_or_default());

    app.navigate(&Route::Feed.fragment()).await;
    let cards = app.views().feed.model().cards;
    let steps = [
        (Membership::Like, cards.first().map(|c| c.id.clone())),
        (Membership::Save, cards.get(1).map(|c| c.id.clone())),
        (Membership::Attend, cards.get(2).map(|c| c.id.clone())),
        (Membership::Follow, Some("h1".to_string())),
    ];
    for (kind, target) in steps {
        let Some(target) = target else { continue };
        match app.toggle(kind, &target).await {
            Ok(active) => output.bullet(&format!("{kind} {target} {} {active}", ICONS.arrow)),
            Err(err) => output.warning(&format!("{kind} {target}: {err}")),
        }
    }

    if let Some(first) = cards.first() {
        app.open_event(&first.id).await?;
        app.submit_comment("Can't wait for this one!", Some(5)).await?;
        let comments = app.views().sheet.detail().map(|d| d.comments.len()).unwrap_or(0);
        output.bullet(&format!("commented on {} ({comments} comments)", first.title));
        app.close_event();
    }

    app.gateway().push_notification("u1", "h1", "Riya mentioned you");
    let folded = app.pump_realtime();
    output.bullet(&format!("{} folded {folded} realtime updates", ICONS.bell));

    let more = app.load_more_feed().await?;
    output.bullet(&format!("loaded {more} more feed cards"));

    output.heading("Feed");
    output.table(&output.events_table(&app.views().feed.model().cards));

    output.heading("State");
    app.store().read(|state| {
        let sets = &state.memberships;
        let name = state.session.as_ref().map(|s| s.display_name().to_string()).unwrap_or_default();
        output.key_value("Signed in as", &name);
        output.key_value("Route", &state.route.current_view.fragment());
        output.key_value("Cached events", &state.events.len().to_string());
        output.key_value(
            "Liked / saved / attending / following",
            &format!(
                "{} / {} / {} / {}",
                sets.liked.len(),
                sets.saved.len(),
                sets.attending.len(),
                sets.following.len()
            ),
        );
    });
    let badge = app.ui().badge();
    output.key_value("Badge", if badge.is_empty() { "-" } else { &badge });
    output.key_value("Backend calls", &app.gateway().calls().len().to_string());
    output.key_value("Last toast", &app.ui().last_toast().unwrap_or_default());

    app.shutdown();
    output.success("demo finished");
    Ok(())
}
