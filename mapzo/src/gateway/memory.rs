//! In-process backend.
//!
//! Mirrors the behaviour of the hosted database closely enough for the
//! client layers to be exercised end to end: denormalised counters,
//! notification fan-out (never to yourself), realtime channels fed by
//! inserts, and row ownership checks on deletes. Every operation is
//! recorded in a call log and any operation can be made to fail once.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc::{self, UnboundedSender};

use super::{AuthProvider, ChannelSpec, Gateway, Geolocator, Membership, RealtimePayload, Subscription};
use crate::errors::{AppError, AppResult};
use crate::id::{generate_event_id, generate_id, subscription_id};
use crate::keys;
use crate::models::{
    ActivityItem, Comment, Event, EventFilters, HostRequest, Identity, MediaUpload, NewEvent, Notification,
    NotificationKind, Profile, ProfilePatch, Rating, UserSummary,
};

/// Page size applied when a query gives no limit.
pub const DEFAULT_PAGE_SIZE: usize = 10;
const NOTIFICATION_PAGE: usize = 30;
const ACTIVITY_PAGE: usize = 20;

type Pair = (String, String);

#[derive(Default)]
struct Tables {
    users: HashMap<String, Profile>,
    events: Vec<Event>,
    /// (user_id, target_id) -> created_at, per relation.
    relations: HashMap<Membership, BTreeMap<Pair, DateTime<Utc>>>,
    comments: Vec<Comment>,
    notifications: Vec<Notification>,
    host_requests: Vec<(String, HostRequest)>,
    storage: BTreeMap<String, usize>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Strictly increasing timestamps so inserts order deterministically.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn summary(&self, user_id: &str) -> Option<UserSummary> {
        self.users.get(user_id).map(UserSummary::from)
    }

    fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == event_id)
    }

    fn event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|event| event.id == event_id)
    }

    fn relation(&mut self, kind: Membership) -> &mut BTreeMap<Pair, DateTime<Utc>> {
        self.relations.entry(kind).or_default()
    }

    fn with_host(&self, mut event: Event) -> Event {
        event.host = self.summary(&event.host_id);
        event
    }

    fn display_name(&self, actor: &Identity) -> String {
        actor
            .display_name
            .clone()
            .or_else(|| self.users.get(&actor.uid).and_then(|p| p.display_name.clone()))
            .unwrap_or_else(|| "Someone".to_string())
    }
}

struct Channel {
    name: String,
    sender: UnboundedSender<RealtimePayload>,
}

#[derive(Default)]
struct Inner {
    tables: Tables,
    channels: Vec<Channel>,
    calls: Vec<String>,
    failures: HashMap<String, String>,
}

fn publish(channels: &mut Vec<Channel>, name: &str, payload: RealtimePayload) {
    channels.retain(|channel| !channel.sender.is_closed());
    for channel in channels.iter().filter(|channel| channel.name == name) {
        let _ = channel.sender.send(payload.clone());
    }
}

fn notify(
    tables: &mut Tables,
    channels: &mut Vec<Channel>,
    user_id: &str,
    actor_id: &str,
    event_id: Option<&str>,
    kind: NotificationKind,
    message: String,
) {
    let notification = Notification {
        id: generate_id(),
        user_id: user_id.to_string(),
        actor_id: actor_id.to_string(),
        actor: tables.summary(actor_id),
        event_id: event_id.map(str::to_string),
        kind,
        message,
        read: false,
        created_at: tables.stamp(),
    };
    tables.notifications.push(notification.clone());
    publish(
        channels,
        &keys::notifications_channel(user_id),
        RealtimePayload::Notifications(notification),
    );
}

/// Notifies the host of `event_id` about an interaction, unless the actor is the host.
fn notify_host(tables: &mut Tables, channels: &mut Vec<Channel>, actor: &Identity, event_id: &str, kind: NotificationKind) {
    let Some((host_id, title)) = tables
        .event(event_id)
        .map(|event| (event.host_id.clone(), event.title.clone()))
    else {
        return;
    };
    if host_id == actor.uid {
        return;
    }
    let name = tables.display_name(actor);
    let message = match kind {
        NotificationKind::Like => format!("{name} liked your event \"{title}\""),
        NotificationKind::Comment => format!("{name} commented on \"{title}\""),
        NotificationKind::Attending => format!("{name} is attending \"{title}\""),
        NotificationKind::Follow => format!("{name} started following you"),
    };
    notify(tables, channels, &host_id, &actor.uid, Some(event_id), kind, message);
}

fn bump(counter: &mut i64, up: bool) {
    *counter = if up { *counter + 1 } else { (*counter - 1).max(0) };
}

fn toggle_op(kind: Membership) -> &'static str {
    match kind {
        Membership::Like => "toggle_like",
        Membership::Save => "toggle_save",
        Membership::Attend => "toggle_attend",
        Membership::Follow => "toggle_follow",
    }
}

fn memberships_op(kind: Membership) -> &'static str {
    match kind {
        Membership::Like => "get_user_likes",
        Membership::Save => "get_user_saves",
        Membership::Attend => "get_user_attending",
        Membership::Follow => "get_following",
    }
}

/// In-memory [`Gateway`].
#[derive(Default)]
pub struct MemoryGateway {
    inner: Mutex<Inner>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logs the call, applies an injected failure, then yields so that
    /// concurrently issued calls interleave like real network requests.
    async fn begin(&self, op: &'static str) -> AppResult<()> {
        {
            let mut inner = self.lock();
            inner.calls.push(op.to_string());
            if let Some(message) = inner.failures.remove(op) {
                log::debug!("memory gateway: injected failure for {op}");
                return Err(AppError::remote(op, message));
            }
        }
        tokio::task::yield_now().await;
        Ok(())
    }

    pub fn insert_user(&self, profile: Profile) {
        self.lock().tables.users.insert(profile.id.clone(), profile);
    }

    pub fn insert_event(&self, event: Event) {
        self.lock().tables.events.push(event);
    }

    /// Seeds a relation row without touching counters or notifications.
    pub fn insert_membership(&self, kind: Membership, user_id: &str, target_id: &str) {
        let mut inner = self.lock();
        let stamp = inner.tables.stamp();
        inner
            .tables
            .relation(kind)
            .insert((user_id.to_string(), target_id.to_string()), stamp);
    }

    /// Inserts a notification for `user_id` and pushes it on their channel.
    pub fn push_notification(&self, user_id: &str, actor_id: &str, message: &str) {
        let mut inner = self.lock();
        let Inner { tables, channels, .. } = &mut *inner;
        notify(
            tables,
            channels,
            user_id,
            actor_id,
            None,
            NotificationKind::Follow,
            message.to_string(),
        );
    }

    /// Makes the next call to `op` fail with `message`.
    pub fn fail_next(&self, op: &str, message: &str) {
        self.lock().failures.insert(op.to_string(), message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, op: &str) -> usize {
        self.lock().calls.iter().filter(|call| call.as_str() == op).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Subscriptions on `channel_name` whose receiver is still alive.
    pub fn active_subscriptions(&self, channel_name: &str) -> usize {
        let mut inner = self.lock();
        inner.channels.retain(|channel| !channel.sender.is_closed());
        inner
            .channels
            .iter()
            .filter(|channel| channel.name == channel_name)
            .count()
    }

    /// Live subscriptions whose channel name starts with `prefix`.
    pub fn active_subscriptions_with_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.lock();
        inner.channels.retain(|channel| !channel.sender.is_closed());
        inner
            .channels
            .iter()
            .filter(|channel| channel.name.starts_with(prefix))
            .count()
    }

    pub fn user(&self, user_id: &str) -> Option<Profile> {
        self.lock().tables.users.get(user_id).cloned()
    }

    pub fn stored_event(&self, event_id: &str) -> Option<Event> {
        self.lock().tables.event(event_id).cloned()
    }

    pub fn has_membership(&self, kind: Membership, user_id: &str, target_id: &str) -> bool {
        self.lock()
            .tables
            .relations
            .get(&kind)
            .is_some_and(|rows| rows.contains_key(&(user_id.to_string(), target_id.to_string())))
    }

    pub fn notifications_for(&self, user_id: &str) -> Vec<Notification> {
        self.lock()
            .tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn host_requests(&self) -> Vec<(String, HostRequest)> {
        self.lock().tables.host_requests.clone()
    }

    pub fn stored_paths(&self) -> Vec<String> {
        self.lock().tables.storage.keys().cloned().collect()
    }
}

impl Gateway for MemoryGateway {
    async fn get_user(&self, user_id: &str) -> AppResult<Option<Profile>> {
        self.begin("get_user").await?;
        Ok(self.lock().tables.users.get(user_id).cloned())
    }

    async fn upsert_user(&self, profile: &Profile) -> AppResult<()> {
        self.begin("upsert_user").await?;
        let mut inner = self.lock();
        inner
            .tables
            .users
            .entry(profile.id.clone())
            .and_modify(|existing| {
                existing.email = profile.email.clone();
                if existing.display_name.is_none() {
                    existing.display_name = profile.display_name.clone();
                }
            })
            .or_insert_with(|| profile.clone());
        Ok(())
    }

    async fn update_user(&self, user_id: &str, patch: &ProfilePatch) -> AppResult<Profile> {
        self.begin("update_user").await?;
        let mut inner = self.lock();
        let profile = inner
            .tables
            .users
            .get_mut(user_id)
            .ok_or_else(|| AppError::not_found(user_id))?;
        patch.apply(profile);
        Ok(profile.clone())
    }

    async fn get_events(&self, filters: &EventFilters) -> AppResult<Vec<Event>> {
        self.begin("get_events").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        let search = filters.search.as_ref().map(|s| s.to_lowercase());
        let mut events: Vec<&Event> = tables
            .events
            .iter()
            .filter(|event| filters.category.as_ref().is_none_or(|c| &event.category == c))
            .filter(|event| filters.is_live.is_none_or(|live| event.is_live == live))
            .filter(|event| filters.host_id.as_ref().is_none_or(|host| &event.host_id == host))
            .filter(|event| {
                search
                    .as_ref()
                    .is_none_or(|needle| event.title.to_lowercase().contains(needle))
            })
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events
            .into_iter()
            .skip(filters.offset.unwrap_or(0))
            .take(filters.limit.unwrap_or(DEFAULT_PAGE_SIZE))
            .map(|event| tables.with_host(event.clone()))
            .collect())
    }

    async fn get_event(&self, event_id: &str) -> AppResult<Option<Event>> {
        self.begin("get_event").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        let Some(event) = tables.event(event_id) else {
            return Ok(None);
        };
        let mut event = tables.with_host(event.clone());

        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .map(|mut c| {
                c.author = tables.summary(&c.user_id);
                c
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        event.comments = comments;

        let mut attending: Vec<(&Pair, &DateTime<Utc>)> = tables
            .relations
            .get(&Membership::Attend)
            .map(|rows| rows.iter().filter(|((_, target), _)| target == event_id).collect())
            .unwrap_or_default();
        attending.sort_by(|a, b| a.1.cmp(b.1));
        event.attendees = attending
            .into_iter()
            .filter_map(|((user_id, _), _)| tables.summary(user_id))
            .collect();
        Ok(Some(event))
    }

    async fn create_event(&self, host: &Identity, new_event: NewEvent) -> AppResult<Event> {
        self.begin("create_event").await?;
        let mut inner = self.lock();
        let Inner { tables, channels, .. } = &mut *inner;
        let is_host = tables.users.get(&host.uid).is_some_and(|p| p.is_host);
        if !is_host {
            return Err(AppError::remote("create_event", "Only verified hosts can publish events"));
        }
        let event = Event {
            id: generate_event_id(),
            title: new_event.title,
            description: Some(new_event.description).filter(|d| !d.is_empty()),
            category: new_event.category,
            venue_name: Some(new_event.venue_name),
            address: Some(new_event.address),
            lat: new_event.lat,
            lng: new_event.lng,
            event_date: new_event.event_date,
            start_time: new_event.start_time,
            end_time: new_event.end_time,
            price: Some(new_event.price),
            image_urls: new_event.image_urls,
            video_urls: new_event.video_urls,
            tags: new_event.tags,
            host_id: host.uid.clone(),
            host: None,
            attending_count: 0,
            like_count: 0,
            is_live: false,
            is_pinned: false,
            attendees: Vec::new(),
            comments: Vec::new(),
            created_at: tables.stamp(),
        };
        tables.events.push(event.clone());
        let event = tables.with_host(event);
        publish(channels, keys::EVENTS_CHANNEL, RealtimePayload::Events(event.clone()));
        Ok(event)
    }

    async fn delete_event(&self, host_id: &str, event_id: &str) -> AppResult<()> {
        self.begin("delete_event").await?;
        let mut inner = self.lock();
        let tables = &mut inner.tables;
        let position = tables
            .events
            .iter()
            .position(|e| e.id == event_id && e.host_id == host_id)
            .ok_or_else(|| AppError::not_found(event_id))?;
        tables.events.remove(position);
        tables.comments.retain(|c| c.event_id != event_id);
        for kind in [Membership::Like, Membership::Save, Membership::Attend] {
            tables.relation(kind).retain(|(_, target), _| target != event_id);
        }
        Ok(())
    }

    async fn toggle(&self, actor: &Identity, kind: Membership, target_id: &str) -> AppResult<bool> {
        let op = toggle_op(kind);
        self.begin(op).await?;
        let mut inner = self.lock();
        let Inner { tables, channels, .. } = &mut *inner;

        if kind.targets_user() {
            if actor.uid == target_id {
                return Err(AppError::InvalidRequest {
                    message: "Cannot follow yourself".to_string(),
                });
            }
            if !tables.users.contains_key(target_id) {
                return Err(AppError::not_found(target_id));
            }
        } else if tables.event(target_id).is_none() {
            return Err(AppError::not_found(target_id));
        }

        let key = (actor.uid.clone(), target_id.to_string());
        let stamp = tables.stamp();
        let relation = tables.relation(kind);
        let active = if relation.remove(&key).is_some() {
            false
        } else {
            relation.insert(key, stamp);
            true
        };

        match kind {
            Membership::Like => {
                if let Some(event) = tables.event_mut(target_id) {
                    bump(&mut event.like_count, active);
                }
            }
            Membership::Attend => {
                if let Some(event) = tables.event_mut(target_id) {
                    bump(&mut event.attending_count, active);
                }
            }
            Membership::Follow => {
                if let Some(target) = tables.users.get_mut(target_id) {
                    bump(&mut target.follower_count, active);
                }
                if let Some(me) = tables.users.get_mut(&actor.uid) {
                    bump(&mut me.following_count, active);
                }
            }
            Membership::Save => {}
        }

        if active {
            match kind {
                Membership::Like => notify_host(tables, channels, actor, target_id, NotificationKind::Like),
                Membership::Attend => notify_host(tables, channels, actor, target_id, NotificationKind::Attending),
                Membership::Follow => {
                    let message = format!("{} started following you", tables.display_name(actor));
                    notify(tables, channels, target_id, &actor.uid, None, NotificationKind::Follow, message);
                }
                Membership::Save => {}
            }
        }
        Ok(active)
    }

    async fn memberships(&self, kind: Membership, user_id: &str) -> AppResult<HashSet<String>> {
        self.begin(memberships_op(kind)).await?;
        let inner = self.lock();
        Ok(inner
            .tables
            .relations
            .get(&kind)
            .map(|rows| {
                rows.keys()
                    .filter(|(user, _)| user == user_id)
                    .map(|(_, target)| target.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_comments(&self, event_id: &str) -> AppResult<Vec<Comment>> {
        self.begin("get_comments").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.event_id == event_id)
            .cloned()
            .map(|mut c| {
                c.author = tables.summary(&c.user_id);
                c
            })
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn add_comment(
        &self,
        actor: &Identity,
        event_id: &str,
        text: &str,
        rating: Option<Rating>,
    ) -> AppResult<Comment> {
        self.begin("add_comment").await?;
        let mut inner = self.lock();
        let Inner { tables, channels, .. } = &mut *inner;
        if tables.event(event_id).is_none() {
            return Err(AppError::not_found(event_id));
        }
        let comment = Comment {
            id: generate_id(),
            event_id: event_id.to_string(),
            user_id: actor.uid.clone(),
            author: tables.summary(&actor.uid),
            text: text.to_string(),
            rating,
            created_at: tables.stamp(),
        };
        tables.comments.push(comment.clone());
        publish(
            channels,
            &keys::comments_channel(event_id),
            RealtimePayload::Comments(comment.clone()),
        );
        notify_host(tables, channels, actor, event_id, NotificationKind::Comment);
        Ok(comment)
    }

    async fn delete_comment(&self, user_id: &str, comment_id: &str) -> AppResult<()> {
        self.begin("delete_comment").await?;
        let mut inner = self.lock();
        let comments = &mut inner.tables.comments;
        let position = comments
            .iter()
            .position(|c| c.id == comment_id && c.user_id == user_id)
            .ok_or_else(|| AppError::not_found(comment_id))?;
        comments.remove(position);
        Ok(())
    }

    async fn get_followers(&self, user_id: &str) -> AppResult<Vec<UserSummary>> {
        self.begin("get_followers").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        Ok(tables
            .relations
            .get(&Membership::Follow)
            .map(|rows| {
                rows.keys()
                    .filter(|(_, following)| following == user_id)
                    .filter_map(|(follower, _)| tables.summary(follower))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_friends_attending(&self, event_id: &str, following: &HashSet<String>) -> AppResult<Vec<UserSummary>> {
        self.begin("get_friends_attending").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        Ok(tables
            .relations
            .get(&Membership::Attend)
            .map(|rows| {
                rows.keys()
                    .filter(|(user, target)| target == event_id && following.contains(user))
                    .filter_map(|(user, _)| tables.summary(user))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_notifications(&self, user_id: &str) -> AppResult<Vec<Notification>> {
        self.begin("get_notifications").await?;
        let inner = self.lock();
        let mut notifications: Vec<Notification> = inner
            .tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(NOTIFICATION_PAGE);
        Ok(notifications)
    }

    async fn mark_notifications_read(&self, user_id: &str) -> AppResult<()> {
        self.begin("mark_notifications_read").await?;
        let mut inner = self.lock();
        inner
            .tables
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
            .for_each(|n| n.read = true);
        Ok(())
    }

    async fn get_unread_count(&self, user_id: &str) -> AppResult<u32> {
        self.begin("get_unread_count").await?;
        let inner = self.lock();
        let count = inner
            .tables
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn get_activity_feed(&self, following: &HashSet<String>) -> AppResult<Vec<ActivityItem>> {
        self.begin("get_activity_feed").await?;
        let inner = self.lock();
        let tables = &inner.tables;
        let mut rows: Vec<(&Pair, &DateTime<Utc>)> = tables
            .relations
            .get(&Membership::Attend)
            .map(|rows| rows.iter().filter(|((user, _), _)| following.contains(user)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| b.1.cmp(a.1));
        Ok(rows
            .into_iter()
            .filter_map(|((user_id, event_id), created_at)| {
                Some(ActivityItem {
                    user: tables.summary(user_id)?,
                    event: tables.event(event_id)?.clone(),
                    created_at: *created_at,
                })
            })
            .take(ACTIVITY_PAGE)
            .collect())
    }

    async fn submit_host_request(&self, user_id: &str, request: &HostRequest) -> AppResult<()> {
        self.begin("submit_host_request").await?;
        self.lock()
            .tables
            .host_requests
            .push((user_id.to_string(), request.clone()));
        Ok(())
    }

    async fn upload_event_media(&self, event_id: &str, upload: &MediaUpload) -> AppResult<String> {
        self.begin("upload_event_media").await?;
        let path = keys::event_media_path(event_id, Utc::now().timestamp_millis(), &upload.file_name);
        self.lock().tables.storage.insert(path.clone(), upload.bytes.len());
        Ok(format!("memory://{}/{path}", keys::MEDIA_BUCKET))
    }

    async fn upload_avatar(&self, user_id: &str, upload: &MediaUpload) -> AppResult<String> {
        self.begin("upload_avatar").await?;
        let path = keys::avatar_path(user_id, &upload.file_name);
        self.lock().tables.storage.insert(path.clone(), upload.bytes.len());
        Ok(format!("memory://{}/{path}", keys::MEDIA_BUCKET))
    }

    async fn subscribe(&self, channel: ChannelSpec) -> AppResult<Subscription> {
        self.begin("subscribe").await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        let name = channel.name();
        self.lock().channels.push(Channel { name, sender });
        Ok(Subscription::new(subscription_id(), channel, receiver))
    }
}

struct Account {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct AuthInner {
    accounts: HashMap<String, Account>,
    federated: Option<Identity>,
    current: Option<Identity>,
    calls: Vec<String>,
}

/// In-memory [`AuthProvider`].
#[derive(Default)]
pub struct MemoryAuth {
    inner: Mutex<AuthInner>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_account(self, email: &str, password: &str, identity: Identity) -> Self {
        self.lock().accounts.insert(
            email.to_lowercase(),
            Account {
                password: password.to_string(),
                identity,
            },
        );
        self
    }

    /// Identity returned by the federated popup; without one the popup is "closed".
    pub fn with_federated(self, identity: Identity) -> Self {
        self.lock().federated = Some(identity);
        self
    }

    /// Pretends a previous session is still signed in.
    pub fn with_current(self, identity: Identity) -> Self {
        self.lock().current = Some(identity);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }
}

impl AuthProvider for MemoryAuth {
    async fn sign_in_federated(&self) -> AppResult<Identity> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        inner.calls.push("sign_in_federated".to_string());
        let identity = inner
            .federated
            .clone()
            .ok_or_else(|| AppError::remote("sign_in_federated", "Popup closed before sign-in"))?;
        inner.current = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_in_email(&self, email: &str, password: &str) -> AppResult<Identity> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        inner.calls.push("sign_in_email".to_string());
        let identity = inner
            .accounts
            .get(&email.trim().to_lowercase())
            .filter(|account| account.password == password)
            .map(|account| account.identity.clone())
            .ok_or_else(|| AppError::remote("sign_in_email", "Invalid email or password"))?;
        inner.current = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_up_email(&self, email: &str, password: &str, display_name: &str) -> AppResult<Identity> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        inner.calls.push("sign_up_email".to_string());
        let key = email.trim().to_lowercase();
        if inner.accounts.contains_key(&key) {
            return Err(AppError::remote("sign_up_email", "Email already in use"));
        }
        let identity = Identity {
            uid: generate_id(),
            display_name: Some(display_name.trim().to_string()),
            email: Some(key.clone()),
            provider: "password".to_string(),
        };
        inner.accounts.insert(
            key,
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        inner.current = Some(identity.clone());
        Ok(identity)
    }

    async fn sign_out(&self) -> AppResult<()> {
        tokio::task::yield_now().await;
        let mut inner = self.lock();
        inner.calls.push("sign_out".to_string());
        inner.current = None;
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.lock().current.clone()
    }

    async fn id_token(&self) -> AppResult<Option<String>> {
        Ok(self.lock().current.as_ref().map(|i| format!("memory-token-{}", i.uid)))
    }
}

/// [`Geolocator`] returning a fixed position, or a permission error for `None`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedLocation(pub Option<(f64, f64)>);

impl Geolocator for FixedLocation {
    async fn current_position(&self) -> AppResult<(f64, f64)> {
        self.0
            .ok_or_else(|| AppError::remote("geolocation", "User denied Geolocation"))
    }
}

/// [`Geolocator`] that never answers, for exercising the timeout path.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendingLocation;

impl Geolocator for PendingLocation {
    async fn current_position(&self) -> AppResult<(f64, f64)> {
        std::future::pending().await
    }
}
