//! Channel names, storage paths and outbound links.

use url::Url;

use crate::errors::{AppError, AppResult};

/// Realtime channel carrying every inserted event.
pub const EVENTS_CHANNEL: &str = "events-channel";

/// Storage bucket shared by event media and avatars.
pub const MEDIA_BUCKET: &str = "event-media";

pub fn comments_channel(event_id: &str) -> String {
    format!("comments-{event_id}")
}

pub fn notifications_channel(user_id: &str) -> String {
    format!("notifs-{user_id}")
}

/// Extension after the last dot, lowercased. Files without one get `bin`.
pub fn file_extension(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_ascii_lowercase(),
        _ => "bin".to_string(),
    }
}

/// `events/{event_id}/{millis}.{ext}`
pub fn event_media_path(event_id: &str, uploaded_at_millis: i64, file_name: &str) -> String {
    format!("events/{event_id}/{uploaded_at_millis}.{}", file_extension(file_name))
}

/// `avatars/{user_id}.{ext}`; re-uploading overwrites.
pub fn avatar_path(user_id: &str, file_name: &str) -> String {
    format!("avatars/{user_id}.{}", file_extension(file_name))
}

pub fn is_video_file(name_or_url: &str) -> bool {
    let lowered = name_or_url.to_ascii_lowercase();
    lowered.contains(".mp4") || lowered.contains(".mov")
}

/// Builds links handed to the share sheet or the maps app.
#[derive(Debug, Clone)]
pub struct LinkContext<'a> {
    pub base_url: &'a str,
}

impl<'a> LinkContext<'a> {
    pub fn new(base_url: &'a str) -> Self {
        Self { base_url }
    }

    fn base(&self) -> AppResult<Url> {
        Url::parse(self.base_url).map_err(|err| AppError::Config {
            message: format!("invalid share_base_url {:?}: {err}", self.base_url),
        })
    }

    /// `{base}#event-{id}`
    pub fn event_share_url(&self, event_id: &str) -> AppResult<String> {
        let mut url = self.base()?;
        url.set_fragment(Some(&format!("event-{event_id}")));
        Ok(url.to_string())
    }

    /// `{base}#profile`
    pub fn profile_share_url(&self) -> AppResult<String> {
        let mut url = self.base()?;
        url.set_fragment(Some("profile"));
        Ok(url.to_string())
    }

    pub fn directions_url(lat: f64, lng: f64) -> String {
        format!("https://maps.google.com/?q={lat},{lng}")
    }
}
