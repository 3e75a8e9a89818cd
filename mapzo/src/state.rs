//! Session-scoped client state shared by every controller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::gateway::Membership;
use crate::models::{Event, Identity, Profile};
use crate::router::{Route, Tab};

/// Related events shown under an event's detail.
pub const RELATED_LIMIT: usize = 5;

/// The signed-in identity and its cached profile row.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub profile: Profile,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.identity.uid
    }

    pub fn display_name(&self) -> &str {
        self.profile
            .display_name
            .as_deref()
            .or(self.identity.display_name.as_deref())
            .unwrap_or("User")
    }
}

/// Ids the session user currently likes, saves, attends or follows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipSets {
    pub liked: HashSet<String>,
    pub saved: HashSet<String>,
    pub attending: HashSet<String>,
    pub following: HashSet<String>,
}

impl MembershipSets {
    pub fn get(&self, kind: Membership) -> &HashSet<String> {
        match kind {
            Membership::Like => &self.liked,
            Membership::Save => &self.saved,
            Membership::Attend => &self.attending,
            Membership::Follow => &self.following,
        }
    }

    fn get_mut(&mut self, kind: Membership) -> &mut HashSet<String> {
        match kind {
            Membership::Like => &mut self.liked,
            Membership::Save => &mut self.saved,
            Membership::Attend => &mut self.attending,
            Membership::Follow => &mut self.following,
        }
    }

    pub fn contains(&self, kind: Membership, id: &str) -> bool {
        self.get(kind).contains(id)
    }

    /// Adds or removes `id`; returns whether the set changed.
    pub fn set(&mut self, kind: Membership, id: &str, active: bool) -> bool {
        let set = self.get_mut(kind);
        if active { set.insert(id.to_string()) } else { set.remove(id) }
    }

    pub fn replace(&mut self, kind: Membership, ids: HashSet<String>) {
        *self.get_mut(kind) = ids;
    }

    pub fn clear(&mut self) {
        for kind in Membership::ALL {
            self.get_mut(kind).clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        Membership::ALL.iter().all(|kind| self.get(*kind).is_empty())
    }
}

/// Current tab and the last sub-view shown inside Discover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteState {
    pub current_tab: Tab,
    pub current_view: Route,
}

impl Default for RouteState {
    fn default() -> Self {
        Self {
            current_tab: Tab::Discover,
            current_view: Route::DEFAULT,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub session: Option<Session>,
    pub memberships: MembershipSets,
    pub route: RouteState,
    /// Recently fetched events, newest first. Never authoritative.
    pub events: Vec<Event>,
    pub unread_notifications: u32,
    /// Bumped on every sign-in and sign-out.
    pub epoch: u64,
}

impl AppState {
    pub fn identity(&self) -> Option<&Identity> {
        self.session.as_ref().map(|s| &s.identity)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.session.as_ref().map(Session::user_id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn begin_session(&mut self, session: Session, memberships: MembershipSets, unread: u32) {
        self.session = Some(session);
        self.memberships = memberships;
        self.unread_notifications = unread;
        self.epoch += 1;
    }

    pub fn end_session(&mut self) {
        self.session = None;
        self.memberships.clear();
        self.unread_notifications = 0;
        self.epoch += 1;
    }

    pub fn event(&self, event_id: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.id == event_id)
    }

    pub fn event_mut(&mut self, event_id: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.id == event_id)
    }

    /// Puts `event` at the front of the cache unless it is already cached.
    pub fn prepend_event(&mut self, event: Event) -> bool {
        if self.event(&event.id).is_some() {
            return false;
        }
        self.events.insert(0, event);
        true
    }

    pub fn replace_events(&mut self, events: Vec<Event>) {
        self.events = events;
    }

    /// Cached events sharing `event`'s category.
    pub fn related_events(&self, event: &Event) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.id != event.id && e.category == event.category)
            .take(RELATED_LIMIT)
            .cloned()
            .collect()
    }

    /// Sets the membership and keeps the cached counters in step.
    ///
    /// Returns the counter delta (`+1`, `-1`) when the set changed, `None`
    /// when it already matched.
    pub fn apply_membership(&mut self, kind: Membership, target_id: &str, active: bool) -> Option<i64> {
        if !self.memberships.set(kind, target_id, active) {
            return None;
        }
        let delta = if active { 1 } else { -1 };
        match kind {
            Membership::Like => {
                if let Some(event) = self.event_mut(target_id) {
                    event.like_count = (event.like_count + delta).max(0);
                }
            }
            Membership::Attend => {
                if let Some(event) = self.event_mut(target_id) {
                    event.attending_count = (event.attending_count + delta).max(0);
                }
            }
            Membership::Follow => {
                if let Some(session) = self.session.as_mut() {
                    session.profile.following_count = (session.profile.following_count + delta).max(0);
                }
            }
            Membership::Save => {}
        }
        Some(delta)
    }
}

/// Shared handle to the [`AppState`]. Clones point at the same state.
#[derive(Debug, Clone, Default)]
pub struct Store {
    inner: Arc<Mutex<AppState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn identity(&self) -> Option<Identity> {
        self.lock().identity().cloned()
    }

    pub fn contains(&self, kind: Membership, id: &str) -> bool {
        self.lock().memberships.contains(kind, id)
    }
}
