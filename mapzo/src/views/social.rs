use std::sync::Mutex;

use chrono::Utc;

use crate::errors::AppResult;
use crate::format::{initials, relative_time};
use crate::gateway::Gateway;
use crate::models::ActivityItem;

use super::{ViewContext, lock};

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    pub user_id: String,
    pub user_name: String,
    pub initials: String,
    pub event_id: String,
    pub event_title: String,
    pub emoji: &'static str,
    pub when: String,
}

impl ActivityEntry {
    fn new(item: &ActivityItem) -> Self {
        let name = item.user.display_name.clone().unwrap_or_else(|| "Someone".to_string());
        Self {
            user_id: item.user.id.clone(),
            initials: initials(&name),
            user_name: name,
            event_id: item.event.id.clone(),
            event_title: item.event.title.clone(),
            emoji: item.event.category.meta().emoji,
            when: relative_time(item.created_at, Utc::now()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SocialState {
    #[default]
    Loading,
    SignedOut,
    /// Signed in but following nobody.
    FollowPeople,
    NoActivity,
    Activity(Vec<ActivityEntry>),
    Error(String),
}

#[derive(Debug, Default)]
pub struct SocialView {
    state: Mutex<SocialState>,
}

impl SocialView {
    pub fn state(&self) -> SocialState {
        lock(&self.state).clone()
    }

    pub(crate) fn reset(&self) {
        *lock(&self.state) = SocialState::Loading;
    }

    /// An empty following set is answered locally without any remote query.
    pub async fn init<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<()> {
        let (signed_in, following, epoch) = cx
            .store
            .read(|state| (state.is_signed_in(), state.memberships.following.clone(), state.epoch));
        if !signed_in {
            *lock(&self.state) = SocialState::SignedOut;
            return Ok(());
        }
        if following.is_empty() {
            *lock(&self.state) = SocialState::FollowPeople;
            return Ok(());
        }

        *lock(&self.state) = SocialState::Loading;
        let result = cx.gateway.get_activity_feed(&following).await;
        let mut state = lock(&self.state);
        if cx.store.epoch() != epoch {
            log::debug!("social: dropping activity feed: session changed");
            return Ok(());
        }
        match result {
            Ok(items) if items.is_empty() => *state = SocialState::NoActivity,
            Ok(items) => *state = SocialState::Activity(items.iter().map(ActivityEntry::new).collect()),
            Err(err) => {
                log::warn!("social: activity feed failed: {err}");
                *state = SocialState::Error("Couldn't load activity".to_string());
                return Err(err);
            }
        }
        Ok(())
    }
}
