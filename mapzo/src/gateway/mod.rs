//! Contracts for the hosted platforms the client talks to.
//!
//! - `Gateway` - database, storage and realtime operations
//! - `AuthProvider` - sign-in/sign-up/sign-out and the current identity
//! - `Geolocator` - the device position for centring the map
//!
//! `memory` provides in-process implementations of all three, used by the
//! demo binary and the test suite.

pub mod fixtures;
pub mod memory;

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, error::TryRecvError};

use crate::errors::AppResult;
use crate::keys;
use crate::models::{
    ActivityItem, Comment, Event, EventFilters, HostRequest, Identity, MediaUpload, NewEvent, Notification, Profile,
    ProfilePatch, Rating, UserSummary,
};

pub use memory::{FixedLocation, MemoryAuth, MemoryGateway};

/// The four per-session membership relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Like,
    Save,
    Attend,
    Follow,
}

impl Membership {
    pub const ALL: [Membership; 4] = [Membership::Like, Membership::Save, Membership::Attend, Membership::Follow];

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Membership::Like => "likes",
            Membership::Save => "saves",
            Membership::Attend => "attending",
            Membership::Follow => "follows",
        }
    }

    /// Follows target users; the rest target events.
    pub fn targets_user(self) -> bool {
        matches!(self, Membership::Follow)
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// A realtime push channel keyed by its filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChannelSpec {
    NewEvents,
    Comments { event_id: String },
    Notifications { user_id: String },
}

impl ChannelSpec {
    pub fn name(&self) -> String {
        match self {
            ChannelSpec::NewEvents => keys::EVENTS_CHANNEL.to_string(),
            ChannelSpec::Comments { event_id } => keys::comments_channel(event_id),
            ChannelSpec::Notifications { user_id } => keys::notifications_channel(user_id),
        }
    }
}

/// Row inserted on a subscribed table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "table", content = "new", rename_all = "snake_case")]
pub enum RealtimePayload {
    Events(Event),
    Comments(Comment),
    Notifications(Notification),
}

/// Receiving end of one realtime channel. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    pub id: String,
    pub channel: ChannelSpec,
    receiver: UnboundedReceiver<RealtimePayload>,
}

impl Subscription {
    pub fn new(id: String, channel: ChannelSpec, receiver: UnboundedReceiver<RealtimePayload>) -> Self {
        Self { id, channel, receiver }
    }

    /// Next buffered message, without waiting.
    pub fn try_next(&mut self) -> Option<RealtimePayload> {
        match self.receiver.try_recv() {
            Ok(payload) => Some(payload),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits for the next message; `None` once the backend closed the channel.
    pub async fn next(&mut self) -> Option<RealtimePayload> {
        self.receiver.recv().await
    }

    pub fn close(&mut self) {
        self.receiver.close();
    }
}

/// Database, storage and realtime operations of the hosted backend.
///
/// Writes are attributed to the identity passed in; the backend's row
/// policies are expected to reject anything else.
#[allow(async_fn_in_trait)]
pub trait Gateway {
    async fn get_user(&self, user_id: &str) -> AppResult<Option<Profile>>;

    async fn upsert_user(&self, profile: &Profile) -> AppResult<()>;

    async fn update_user(&self, user_id: &str, patch: &ProfilePatch) -> AppResult<Profile>;

    /// Newest first.
    async fn get_events(&self, filters: &EventFilters) -> AppResult<Vec<Event>>;

    /// Full detail with host, comments and attendees.
    async fn get_event(&self, event_id: &str) -> AppResult<Option<Event>>;

    async fn create_event(&self, host: &Identity, event: NewEvent) -> AppResult<Event>;

    async fn delete_event(&self, host_id: &str, event_id: &str) -> AppResult<()>;

    /// Flips `actor`'s membership for `target_id` and returns the new state.
    async fn toggle(&self, actor: &Identity, kind: Membership, target_id: &str) -> AppResult<bool>;

    /// Ids `user_id` currently has in the `kind` relation.
    async fn memberships(&self, kind: Membership, user_id: &str) -> AppResult<HashSet<String>>;

    async fn get_comments(&self, event_id: &str) -> AppResult<Vec<Comment>>;

    async fn add_comment(&self, actor: &Identity, event_id: &str, text: &str, rating: Option<Rating>)
        -> AppResult<Comment>;

    async fn delete_comment(&self, user_id: &str, comment_id: &str) -> AppResult<()>;

    async fn get_followers(&self, user_id: &str) -> AppResult<Vec<UserSummary>>;

    async fn get_friends_attending(&self, event_id: &str, following: &HashSet<String>) -> AppResult<Vec<UserSummary>>;

    /// Latest 30, newest first.
    async fn get_notifications(&self, user_id: &str) -> AppResult<Vec<Notification>>;

    async fn mark_notifications_read(&self, user_id: &str) -> AppResult<()>;

    async fn get_unread_count(&self, user_id: &str) -> AppResult<u32>;

    /// Attending rows of `following`, newest first, at most 20.
    async fn get_activity_feed(&self, following: &HashSet<String>) -> AppResult<Vec<ActivityItem>>;

    async fn submit_host_request(&self, user_id: &str, request: &HostRequest) -> AppResult<()>;

    /// Returns the public url of the stored file.
    async fn upload_event_media(&self, event_id: &str, upload: &MediaUpload) -> AppResult<String>;

    async fn upload_avatar(&self, user_id: &str, upload: &MediaUpload) -> AppResult<String>;

    async fn subscribe(&self, channel: ChannelSpec) -> AppResult<Subscription>;
}

/// Hosted authentication provider.
#[allow(async_fn_in_trait)]
pub trait AuthProvider {
    async fn sign_in_federated(&self) -> AppResult<Identity>;

    async fn sign_in_email(&self, email: &str, password: &str) -> AppResult<Identity>;

    async fn sign_up_email(&self, email: &str, password: &str, display_name: &str) -> AppResult<Identity>;

    async fn sign_out(&self) -> AppResult<()>;

    /// Identity restored from a previous session, if any.
    fn current(&self) -> Option<Identity>;

    /// Bearer token for a private API.
    async fn id_token(&self) -> AppResult<Option<String>>;
}

#[allow(async_fn_in_trait)]
pub trait Geolocator {
    /// `(lat, lng)` of the device.
    async fn current_position(&self) -> AppResult<(f64, f64)>;
}
