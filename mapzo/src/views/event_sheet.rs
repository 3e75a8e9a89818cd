use std::sync::Mutex;

use chrono::Utc;

use crate::errors::{AppError, AppResult};
use crate::format::{format_event_date, initials, relative_time};
use crate::gateway::{Gateway, Membership};
use crate::models::{Category, Comment, Event, UserSummary};
use crate::state::MembershipSets;

use super::{EventCard, ViewContext, lock, today};

pub const ATTENDEE_PREVIEW: usize = 5;
pub const COMMENT_PREVIEW: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct CommentItem {
    pub id: String,
    pub user_id: String,
    pub author_name: String,
    pub initials: String,
    pub text: String,
    pub stars: Option<String>,
    pub when: String,
    /// Written by the session user, so it can be deleted.
    pub own: bool,
}

impl CommentItem {
    pub fn new(comment: &Comment, me: Option<&str>) -> Self {
        let name = comment
            .author
            .as_ref()
            .and_then(|a| a.display_name.clone())
            .unwrap_or_else(|| "User".to_string());
        Self {
            id: comment.id.clone(),
            user_id: comment.user_id.clone(),
            initials: initials(&name),
            author_name: name,
            text: comment.text.clone(),
            stars: comment.rating.map(|r| r.stars()),
            when: relative_time(comment.created_at, Utc::now()),
            own: me == Some(comment.user_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventDetail {
    pub event_id: String,
    pub title: String,
    pub category: Category,
    pub emoji: &'static str,
    pub when: String,
    pub venue: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub price: String,
    pub is_free: bool,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
    pub video_urls: Vec<String>,
    pub host: Option<UserSummary>,
    pub host_id: String,
    pub is_own: bool,
    pub liked: bool,
    pub saved: bool,
    pub attending: bool,
    pub following_host: bool,
    pub like_count: i64,
    pub attending_count: i64,
    pub attendees: Vec<UserSummary>,
    /// Attendees beyond the preview, shown as `+N`.
    pub more_attendees: usize,
    pub friends_attending: Vec<UserSummary>,
    pub comments: Vec<CommentItem>,
    pub related: Vec<EventCard>,
}

impl EventDetail {
    fn new(
        event: &Event,
        memberships: &MembershipSets,
        me: Option<&str>,
        friends_attending: Vec<UserSummary>,
        related: &[Event],
    ) -> Self {
        let today = today();
        Self {
            event_id: event.id.clone(),
            title: event.title.clone(),
            category: event.category.clone(),
            emoji: event.category.meta().emoji,
            when: format_event_date(event.event_date, event.start_time, today),
            venue: event.venue_label().to_string(),
            address: event.address.clone(),
            lat: event.lat,
            lng: event.lng,
            price: event.price_label().to_string(),
            is_free: event.is_free(),
            description: event.description.clone(),
            tags: event.tags.clone(),
            image_urls: event.image_urls.clone(),
            video_urls: event.video_urls.clone(),
            host: event.host.clone(),
            host_id: event.host_id.clone(),
            is_own: me == Some(event.host_id.as_str()),
            liked: memberships.contains(Membership::Like, &event.id),
            saved: memberships.contains(Membership::Save, &event.id),
            attending: memberships.contains(Membership::Attend, &event.id),
            following_host: memberships.contains(Membership::Follow, &event.host_id),
            like_count: event.like_count,
            attending_count: event.attending_count,
            attendees: event.attendees.iter().take(ATTENDEE_PREVIEW).cloned().collect(),
            more_attendees: event.attendees.len().saturating_sub(ATTENDEE_PREVIEW),
            friends_attending,
            comments: event
                .comments
                .iter()
                .take(COMMENT_PREVIEW)
                .map(|c| CommentItem::new(c, me))
                .collect(),
            related: related.iter().map(|e| EventCard::new(e, memberships, today)).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SheetState {
    #[default]
    Closed,
    Loading {
        event_id: String,
    },
    Ready(Box<EventDetail>),
}

/// Detail sheet of one event.
#[derive(Debug, Default)]
pub struct EventSheet {
    state: Mutex<SheetState>,
}

impl EventSheet {
    pub fn state(&self) -> SheetState {
        lock(&self.state).clone()
    }

    pub fn detail(&self) -> Option<EventDetail> {
        match &*lock(&self.state) {
            SheetState::Ready(detail) => Some((**detail).clone()),
            _ => None,
        }
    }

    /// Event shown or being loaded.
    pub fn event_id(&self) -> Option<String> {
        match &*lock(&self.state) {
            SheetState::Closed => None,
            SheetState::Loading { event_id } => Some(event_id.clone()),
            SheetState::Ready(detail) => Some(detail.event_id.clone()),
        }
    }

    pub fn is_showing(&self, event_id: &str) -> bool {
        self.event_id().as_deref() == Some(event_id)
    }

    /// Shows the loading state, then the fetched event.
    ///
    /// Returns `Ok(false)` when the sheet was closed or switched to another
    /// event while the fetch was pending; the result is then dropped.
    pub async fn open<G: Gateway>(&self, cx: ViewContext<'_, G>, event_id: &str) -> AppResult<bool> {
        *lock(&self.state) = SheetState::Loading {
            event_id: event_id.to_string(),
        };

        let fetched = match cx.gateway.get_event(event_id).await {
            Ok(Some(event)) => Ok(event),
            Ok(None) => Err(AppError::not_found(event_id)),
            Err(err) => Err(err),
        };
        let event = match fetched {
            Ok(event) => event,
            Err(err) => {
                let mut state = lock(&self.state);
                if matches!(&*state, SheetState::Loading { event_id: id } if id == event_id) {
                    *state = SheetState::Closed;
                }
                return Err(err);
            }
        };

        let following = cx.store.read(|state| state.memberships.following.clone());
        let friends = if following.is_empty() {
            Vec::new()
        } else {
            cx.gateway
                .get_friends_attending(event_id, &following)
                .await
                .unwrap_or_else(|err| {
                    log::debug!("friends attending {event_id} unavailable: {err}");
                    Vec::new()
                })
        };

        let detail = cx.store.read(|state| {
            let related = state.related_events(&event);
            EventDetail::new(&event, &state.memberships, state.user_id(), friends, &related)
        });

        let mut state = lock(&self.state);
        if !matches!(&*state, SheetState::Loading { event_id: id } if id == event_id) {
            log::debug!("sheet moved on before {event_id} loaded");
            return Ok(false);
        }
        *state = SheetState::Ready(Box::new(detail));
        Ok(true)
    }

    pub fn close(&self) {
        *lock(&self.state) = SheetState::Closed;
    }

    /// Puts `comment` at the top of the open sheet's list unless it is
    /// already there.
    pub fn prepend_comment(&self, comment: &Comment, me: Option<&str>) -> bool {
        let mut state = lock(&self.state);
        let SheetState::Ready(detail) = &mut *state else {
            return false;
        };
        if detail.event_id != comment.event_id || detail.comments.iter().any(|c| c.id == comment.id) {
            return false;
        }
        detail.comments.insert(0, CommentItem::new(comment, me));
        true
    }

    pub fn remove_comment(&self, comment_id: &str) -> bool {
        let mut state = lock(&self.state);
        let SheetState::Ready(detail) = &mut *state else {
            return false;
        };
        let before = detail.comments.len();
        detail.comments.retain(|c| c.id != comment_id);
        detail.comments.len() != before
    }

    pub(crate) fn reflect(&self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        let mut state = lock(&self.state);
        let SheetState::Ready(detail) = &mut *state else {
            return;
        };
        match kind {
            Membership::Like if detail.event_id == target_id => {
                detail.liked = active;
                detail.like_count = (detail.like_count + delta).max(0);
            }
            Membership::Save if detail.event_id == target_id => detail.saved = active,
            Membership::Attend if detail.event_id == target_id => {
                detail.attending = active;
                detail.attending_count = (detail.attending_count + delta).max(0);
            }
            Membership::Follow if detail.host_id == target_id => detail.following_host = active,
            _ => {}
        }
        for card in &mut detail.related {
            card.reflect(kind, target_id, active, delta);
        }
    }
}
