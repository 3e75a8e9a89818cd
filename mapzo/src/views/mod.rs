//! Per-pane controllers.
//!
//! Each controller owns a plain-data view model behind a mutex and fills it
//! from the gateway. Locks are only taken between awaits, never across one.

pub mod event_sheet;
pub mod explore;
pub mod feed;
pub mod host;
pub mod list;
pub mod map;
pub mod profile;
pub mod social;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Local, NaiveDate};

use crate::config::MapzoConfig;
use crate::format::format_event_date;
use crate::gateway::Membership;
use crate::models::{Category, Event};
use crate::state::{MembershipSets, Store};
use crate::ui::Ui;

pub use event_sheet::EventSheet;
pub use explore::ExploreView;
pub use feed::FeedView;
pub use host::HostView;
pub use list::ListView;
pub use map::MapView;
pub use profile::ProfileView;
pub use social::SocialView;

/// Collaborators handed to every controller call.
pub struct ViewContext<'a, G> {
    pub gateway: &'a G,
    pub store: &'a Store,
    pub ui: &'a Ui,
    pub config: &'a MapzoConfig,
}

impl<G> Clone for ViewContext<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G> Copy for ViewContext<'_, G> {}

pub(crate) fn lock<M>(model: &Mutex<M>) -> MutexGuard<'_, M> {
    model.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// An event as shown on feed, list and profile cards.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCard {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub emoji: &'static str,
    pub when: String,
    pub venue: String,
    pub price: String,
    pub cover_url: Option<String>,
    pub host_id: String,
    pub host_name: Option<String>,
    pub like_count: i64,
    pub attending_count: i64,
    pub is_live: bool,
    pub liked: bool,
    pub saved: bool,
    pub attending: bool,
    pub following_host: bool,
}

impl EventCard {
    pub fn new(event: &Event, memberships: &MembershipSets, today: NaiveDate) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            category: event.category.clone(),
            emoji: event.category.meta().emoji,
            when: format_event_date(event.event_date, event.start_time, today),
            venue: event.venue_label().to_string(),
            price: event.price_label().to_string(),
            cover_url: event.image_urls.first().cloned(),
            host_id: event.host_id.clone(),
            host_name: event.host.as_ref().and_then(|h| h.display_name.clone()),
            like_count: event.like_count,
            attending_count: event.attending_count,
            is_live: event.is_live,
            liked: memberships.contains(Membership::Like, &event.id),
            saved: memberships.contains(Membership::Save, &event.id),
            attending: memberships.contains(Membership::Attend, &event.id),
            following_host: memberships.contains(Membership::Follow, &event.host_id),
        }
    }

    /// Reflects a settled or optimistic membership change on this card.
    pub fn reflect(&mut self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        match kind {
            Membership::Like if self.id == target_id => {
                self.liked = active;
                self.like_count = (self.like_count + delta).max(0);
            }
            Membership::Save if self.id == target_id => self.saved = active,
            Membership::Attend if self.id == target_id => {
                self.attending = active;
                self.attending_count = (self.attending_count + delta).max(0);
            }
            Membership::Follow if self.host_id == target_id => self.following_host = active,
            _ => {}
        }
    }
}

pub(crate) fn cards(events: &[Event], memberships: &MembershipSets) -> Vec<EventCard> {
    let today = today();
    events.iter().map(|e| EventCard::new(e, memberships, today)).collect()
}

/// All pane controllers of one app instance.
#[derive(Debug, Default)]
pub struct Views {
    pub map: MapView,
    pub feed: FeedView,
    pub list: ListView,
    pub explore: ExploreView,
    pub social: SocialView,
    pub profile: ProfileView,
    pub sheet: EventSheet,
    pub host: HostView,
}

impl Views {
    /// Updates every rendered affordance bound to `target_id`.
    pub fn reflect(&self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        self.feed.reflect(kind, target_id, active, delta);
        self.list.reflect(kind, target_id, active, delta);
        self.sheet.reflect(kind, target_id, active, delta);
        self.profile.reflect(kind, target_id, active, delta);
    }

    /// Drops everything derived from the signed-in user.
    pub fn clear_session(&self) {
        self.social.reset();
        self.profile.reset();
        self.host.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::fixtures;

    #[test]
    fn card_flags_follow_memberships() {
        let mut sets = MembershipSets::default();
        sets.set(Membership::Save, "e1", true);
        sets.set(Membership::Follow, "host", true);
        let event = fixtures::event("e1", "Jam", Category::Music, "host", 0);
        let card = EventCard::new(&event, &sets, fixtures::epoch().date_naive());
        assert!(card.saved);
        assert!(!card.liked);
        assert!(card.following_host);
        assert_eq!(card.emoji, "🎵");
        assert_eq!(card.price, "Free");
    }

    #[test]
    fn reflect_only_touches_the_bound_card() {
        let sets = MembershipSets::default();
        let event = fixtures::event("e1", "Jam", Category::Music, "host", 0);
        let mut card = EventCard::new(&event, &sets, fixtures::epoch().date_naive());
        card.reflect(Membership::Like, "e2", true, 1);
        assert!(!card.liked);
        card.reflect(Membership::Like, "e1", true, 1);
        assert!(card.liked);
        assert_eq!(card.like_count, 1);
        card.reflect(Membership::Follow, "host", true, 1);
        assert!(card.following_host);
    }
}
