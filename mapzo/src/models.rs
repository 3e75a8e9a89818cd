//! Records exchanged with the hosted backend.
//!
//! Field names follow the backend's column names so the same structs can be
//! decoded straight from query results and realtime payloads.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Authenticated identity delivered by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    /// `password` or the federated provider id, e.g. `google.com`.
    pub provider: String,
}

/// Row of the `users` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub is_host: bool,
    #[serde(default)]
    pub follower_count: i64,
    #[serde(default)]
    pub following_count: i64,
}

impl Profile {
    /// Seed row written on first sign-in.
    pub fn from_identity(identity: &Identity) -> Self {
        Self {
            id: identity.uid.clone(),
            email: identity.email.clone().unwrap_or_default(),
            display_name: identity.display_name.clone(),
            ..Default::default()
        }
    }
}

/// Fields the edit-profile sheet may change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub interests: Option<Vec<String>>,
    pub avatar_url: Option<String>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.display_name {
            profile.display_name = Some(name.clone());
        }
        if let Some(bio) = &self.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(instagram) = &self.instagram {
            profile.instagram = Some(instagram.clone());
        }
        if let Some(interests) = &self.interests {
            profile.interests = interests.clone();
        }
        if let Some(avatar) = &self.avatar_url {
            profile.avatar_url = Some(avatar.clone());
        }
    }
}

/// Projection of a user embedded in other records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_host: bool,
}

impl From<&Profile> for UserSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            display_name: profile.display_name.clone(),
            avatar_url: profile.avatar_url.clone(),
            is_host: profile.is_host,
        }
    }
}

/// Display metadata for a category chip or pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryMeta {
    pub emoji: &'static str,
    pub color: &'static str,
    pub accent: &'static str,
    pub class: &'static str,
}

const FALLBACK_META: CategoryMeta = CategoryMeta {
    emoji: "📍",
    color: "#1a1a1a",
    accent: "#888",
    class: "",
};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Music,
    Party,
    Tech,
    Food,
    Sports,
    Cultural,
    Nightlife,
    Markets,
    Wellness,
    Other(String),
}

impl Category {
    /// The fixed set shown in the explore grid, in display order.
    pub const KNOWN: [Category; 9] = [
        Category::Music,
        Category::Party,
        Category::Tech,
        Category::Food,
        Category::Sports,
        Category::Cultural,
        Category::Nightlife,
        Category::Markets,
        Category::Wellness,
    ];

    pub fn name(&self) -> &str {
        match self {
            Category::Music => "Music",
            Category::Party => "Party",
            Category::Tech => "Tech",
            Category::Food => "Food",
            Category::Sports => "Sports",
            Category::Cultural => "Cultural",
            Category::Nightlife => "Nightlife",
            Category::Markets => "Markets",
            Category::Wellness => "Wellness",
            Category::Other(name) => name,
        }
    }

    pub fn meta(&self) -> CategoryMeta {
        let (emoji, color, accent, class) = match self {
            Category::Music => ("🎵", "#2d1050", "#c070ff", "cat-music"),
            Category::Party => ("🎉", "#3a1800", "#ff7040", "cat-party"),
            Category::Tech => ("💻", "#001e3a", "#40d0ff", "cat-tech"),
            Category::Food => ("🍕", "#1a2e00", "#90e040", "cat-food"),
            Category::Sports => ("⚽", "#3a0000", "#ff5050", "cat-sports"),
            Category::Cultural => ("🎭", "#2e2800", "#ffd040", "cat-cultural"),
            Category::Nightlife => ("🌙", "#1a0030", "#ff40b0", "cat-nightlife"),
            Category::Markets => ("🛍", "#2a1a00", "#ffaa40", "cat-markets"),
            Category::Wellness => ("🧘", "#002a1a", "#40ffaa", "cat-wellness"),
            Category::Other(_) => return FALLBACK_META,
        };
        CategoryMeta {
            emoji,
            color,
            accent,
            class,
        }
    }

    /// Case-insensitive match used by the map filter chips.
    pub fn matches_filter(&self, filter: &str) -> bool {
        filter.eq_ignore_ascii_case("all") || self.name().eq_ignore_ascii_case(filter)
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        Category::KNOWN
            .iter()
            .find(|known| known.name() == value)
            .cloned()
            .unwrap_or(Category::Other(value))
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.name().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Row of the `events` table with its relational projections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category: Category,
    #[serde(default)]
    pub venue_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub video_urls: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub host_id: String,
    #[serde(default)]
    pub host: Option<UserSummary>,
    #[serde(default)]
    pub attending_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub attendees: Vec<UserSummary>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn venue_label(&self) -> &str {
        self.venue_name
            .as_deref()
            .or(self.address.as_deref())
            .unwrap_or("?")
    }

    pub fn price_label(&self) -> &str {
        match self.price.as_deref() {
            Some(price) if !price.trim().is_empty() => price,
            _ => "Free",
        }
    }

    pub fn is_free(&self) -> bool {
        self.price_label() == "Free"
    }

    /// Events without a usable location never become pins.
    pub fn has_location(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && !(self.lat == 0.0 && self.lng == 0.0)
    }
}

/// Create-event form input, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub category: Option<Category>,
    pub event_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub venue: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub price: String,
    pub description: String,
    /// Raw comma separated input, e.g. `music, #live`.
    pub tags: String,
    pub media: Vec<MediaUpload>,
}

/// Validated event payload ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub category: Category,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: Option<NaiveTime>,
    pub venue_name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    pub price: String,
    pub description: String,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_urls: Vec<String>,
}

/// Query filters for `get_events`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventFilters {
    pub category: Option<Category>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub is_live: Option<bool>,
    pub host_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventFilters {
    pub fn limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Default::default()
        }
    }

    pub fn page(limit: usize, offset: usize) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            ..Default::default()
        }
    }

    pub fn hosted_by(host_id: impl Into<String>) -> Self {
        Self {
            host_id: Some(host_id.into()),
            ..Default::default()
        }
    }
}

/// Star rating attached to a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn new(value: u8) -> Option<Self> {
        (1..=5).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// `★★★☆☆`
    pub fn stars(self) -> String {
        let filled = usize::from(self.0);
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value).ok_or_else(|| format!("rating must be between 1 and 5, got {value}"))
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Row of the `comments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub event_id: String,
    pub user_id: String,
    #[serde(default)]
    pub author: Option<UserSummary>,
    pub text: String,
    #[serde(default)]
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Like,
    Comment,
    Attending,
    Follow,
}

/// Row of the `notifications` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub actor_id: String,
    #[serde(default)]
    pub actor: Option<UserSummary>,
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// "X is attending Y" entry of the social feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    pub user: UserSummary,
    pub event: Event,
    pub created_at: DateTime<Utc>,
}

/// Host verification form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRequest {
    pub full_name: String,
    pub org: String,
    pub email: String,
    pub reason: String,
}

/// File chosen in a form, before upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}
