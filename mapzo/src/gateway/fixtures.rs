//! Record builders for seeding the in-memory backend.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::models::{Category, Event, Identity, Profile};

/// Fixed reference instant so seeded data orders deterministically.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn profile(id: &str, display_name: &str) -> Profile {
    Profile {
        id: id.to_string(),
        email: format!("{id}@mapzo.test"),
        display_name: Some(display_name.to_string()),
        ..Default::default()
    }
}

pub fn host_profile(id: &str, display_name: &str) -> Profile {
    Profile {
        is_host: true,
        ..profile(id, display_name)
    }
}

pub fn identity(id: &str, display_name: &str) -> Identity {
    Identity {
        uid: id.to_string(),
        display_name: Some(display_name.to_string()),
        email: Some(format!("{id}@mapzo.test")),
        provider: "password".to_string(),
    }
}

/// An event `minutes_after_epoch` minutes after [`epoch`], so larger
/// values sort as newer.
pub fn event(id: &str, title: &str, category: Category, host_id: &str, minutes_after_epoch: i64) -> Event {
    Event {
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        category,
        venue_name: Some("Netaji Auditorium".to_string()),
        address: None,
        lat: 22.3149,
        lng: 87.3105,
        event_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap_or_default(),
        start_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or_default(),
        end_time: None,
        price: None,
        image_urls: Vec::new(),
        video_urls: Vec::new(),
        tags: Vec::new(),
        host_id: host_id.to_string(),
        host: None,
        attending_count: 0,
        like_count: 0,
        is_live: false,
        is_pinned: false,
        attendees: Vec::new(),
        comments: Vec::new(),
        created_at: epoch() + Duration::minutes(minutes_after_epoch),
    }
}
