use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// `just now`, `5m ago`, `3h ago`, `2d ago`. Future timestamps read as `just now`.
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = (now - then).num_minutes();
    if mins < 1 {
        return "just now".to_string();
    }
    if mins < 60 {
        return format!("{mins}m ago");
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{hours}h ago");
    }
    format!("{}d ago", hours / 24)
}

/// `Tonight · 19:30`, `Tomorrow · 09:00` or `Sat, Nov 1 · 19:30`.
pub fn format_event_date(date: NaiveDate, time: NaiveTime, today: NaiveDate) -> String {
    let clock = time.format("%H:%M");
    if date == today {
        format!("Tonight · {clock}")
    } else if Some(date) == today.checked_add_signed(Duration::days(1)) {
        format!("Tomorrow · {clock}")
    } else {
        format!("{} · {clock}", date.format("%a, %b %-d"))
    }
}

/// Avatar fallback letter.
pub fn initials(name: &str) -> String {
    name.trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// `Ana Lopez` -> `analopez`
pub fn handle(display_name: &str) -> String {
    WHITESPACE.replace_all(&display_name.to_lowercase(), "").into_owned()
}

/// Notification badge text; empty means hidden.
pub fn badge_text(count: u32) -> String {
    match count {
        0 => String::new(),
        1..=9 => count.to_string(),
        _ => "9+".to_string(),
    }
}

/// Attendee counter drawn on a map pin; `None` draws no counter.
pub fn pin_count_label(attending: i64) -> Option<String> {
    match attending {
        n if n <= 0 => None,
        n if n > 99 => Some("99+".to_string()),
        n => Some(n.to_string()),
    }
}
