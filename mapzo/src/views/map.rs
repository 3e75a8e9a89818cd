use std::sync::Mutex;
use std::time::Duration;

use crate::config::AppSettings;
use crate::errors::AppResult;
use crate::format::{format_event_date, pin_count_label};
use crate::gateway::{Gateway, Geolocator};
use crate::models::{Category, Event, EventFilters};

use super::{ViewContext, lock, today};

pub const PINNED_Z_INDEX: i32 = 100;
pub const DEFAULT_Z_INDEX: i32 = 10;
/// Heat weight is the attendee count, capped here.
pub const MAX_HEAT_WEIGHT: i64 = 100;
pub const ALL_CATEGORIES: &str = "All";

#[derive(Debug, Clone, PartialEq)]
pub struct Pin {
    pub event_id: String,
    pub title: String,
    pub lat: f64,
    pub lng: f64,
    pub category: Category,
    pub emoji: &'static str,
    pub color: &'static str,
    pub count_label: Option<String>,
    pub z_index: i32,
    pub visible: bool,
}

impl Pin {
    fn new(event: &Event, filter: &str) -> Self {
        let meta = event.category.meta();
        Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            lat: event.lat,
            lng: event.lng,
            category: event.category.clone(),
            emoji: meta.emoji,
            color: meta.color,
            count_label: pin_count_label(event.attending_count),
            z_index: if event.is_pinned { PINNED_Z_INDEX } else { DEFAULT_Z_INDEX },
            visible: event.category.matches_filter(filter),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub weight: f64,
}

/// Card shown when a pin is tapped.
#[derive(Debug, Clone, PartialEq)]
pub struct PinPreview {
    pub event_id: String,
    pub title: String,
    pub emoji: &'static str,
    pub when: String,
    pub venue: String,
    pub price: String,
    pub attending_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapModel {
    pub center: (f64, f64),
    pub zoom: u8,
    /// The centre came from the device rather than the configured default.
    pub located: bool,
    pub pins: Vec<Pin>,
    pub heat: Vec<HeatPoint>,
    pub filter: String,
    pub preview: Option<PinPreview>,
    pub error: Option<String>,
}

impl Default for MapModel {
    fn default() -> Self {
        Self {
            center: (0.0, 0.0),
            zoom: 0,
            located: false,
            pins: Vec::new(),
            heat: Vec::new(),
            filter: ALL_CATEGORIES.to_string(),
            preview: None,
            error: None,
        }
    }
}

impl MapModel {
    pub fn visible_pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.iter().filter(|pin| pin.visible)
    }

    pub fn pin(&self, event_id: &str) -> Option<&Pin> {
        self.pins.iter().find(|pin| pin.event_id == event_id)
    }
}

#[derive(Debug, Default)]
pub struct MapView {
    model: Mutex<MapModel>,
}

impl MapView {
    pub fn model(&self) -> MapModel {
        lock(&self.model).clone()
    }

    /// Centres the map, loads the events cache and draws pins and heat.
    pub async fn init<G: Gateway, L: Geolocator>(&self, cx: ViewContext<'_, G>, geolocator: &L) -> AppResult<()> {
        let app = &cx.config.app;
        let (center, located) = locate(app, geolocator).await;
        {
            let mut model = lock(&self.model);
            model.center = center;
            model.zoom = app.default_zoom;
            model.located = located;
            model.error = None;
        }

        let events = match cx.gateway.get_events(&EventFilters::limit(app.map_event_limit)).await {
            Ok(events) => events,
            Err(err) => {
                log::warn!("map: loading events failed: {err}");
                lock(&self.model).error = Some("Couldn't load events".to_string());
                return Err(err);
            }
        };
        cx.store.update(|state| state.replace_events(events.clone()));
        self.render(&events);
        Ok(())
    }

    /// Replaces all pins and heat points with `events`.
    pub fn render(&self, events: &[Event]) {
        let mut model = lock(&self.model);
        let filter = model.filter.clone();
        model.pins = events
            .iter()
            .filter(|e| e.has_location())
            .map(|e| Pin::new(e, &filter))
            .collect();
        model.heat = events.iter().filter_map(heat_point).collect();
    }

    /// Adds a pin for a newly seen event. Events without coordinates and
    /// events that already have a pin are skipped.
    pub fn add_pin(&self, event: &Event) -> bool {
        if !event.has_location() {
            return false;
        }
        let mut model = lock(&self.model);
        if model.pin(&event.id).is_some() {
            return false;
        }
        let pin = Pin::new(event, &model.filter);
        model.pins.push(pin);
        if let Some(point) = heat_point(event) {
            model.heat.push(point);
        }
        true
    }

    /// Shows only pins of `filter` (`All` shows every pin). Returns how many are visible.
    pub fn set_filter(&self, filter: &str) -> usize {
        let mut model = lock(&self.model);
        model.filter = filter.to_string();
        for pin in &mut model.pins {
            pin.visible = pin.category.matches_filter(filter);
        }
        model.visible_pins().count()
    }

    pub fn show_preview(&self, event: &Event) {
        lock(&self.model).preview = Some(PinPreview {
            event_id: event.id.clone(),
            title: event.title.clone(),
            emoji: event.category.meta().emoji,
            when: format_event_date(event.event_date, event.start_time, today()),
            venue: event.venue_label().to_string(),
            price: event.price_label().to_string(),
            attending_count: event.attending_count,
        });
    }

    pub fn close_preview(&self) {
        lock(&self.model).preview = None;
    }
}

async fn locate<L: Geolocator>(app: &AppSettings, geolocator: &L) -> ((f64, f64), bool) {
    let fallback = (app.default_lat, app.default_lng);
    let timeout = Duration::from_millis(app.geolocation_timeout_ms);
    match tokio::time::timeout(timeout, geolocator.current_position()).await {
        Ok(Ok(position)) => (position, true),
        Ok(Err(err)) => {
            log::debug!("geolocation unavailable: {err}");
            (fallback, false)
        }
        Err(_) => {
            log::debug!("geolocation timed out after {}ms", app.geolocation_timeout_ms);
            (fallback, false)
        }
    }
}

fn heat_point(event: &Event) -> Option<HeatPoint> {
    (event.has_location() && event.attending_count > 0).then(|| HeatPoint {
        lat: event.lat,
        lng: event.lng,
        weight: event.attending_count.min(MAX_HEAT_WEIGHT) as f64,
    })
}
