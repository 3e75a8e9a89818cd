use std::sync::Mutex;

use chrono::Utc;

use crate::errors::{AppError, AppResult, ValidationError};
use crate::format::{handle, initials, relative_time};
use crate::gateway::{Gateway, Membership};
use crate::keys::LinkContext;
use crate::models::{Event, EventFilters, MediaUpload, Notification, NotificationKind, Profile, ProfilePatch};
use crate::state::Store;
use crate::validators::{parse_interests, validate_upload};

use super::{EventCard, ViewContext, cards, lock};

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSummary {
    pub user_id: String,
    pub display_name: String,
    pub handle: String,
    pub initials: String,
    pub bio: Option<String>,
    pub instagram: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub is_host: bool,
}

impl ProfileSummary {
    pub fn new(profile: &Profile) -> Self {
        let name = profile.display_name.clone().unwrap_or_else(|| "User".to_string());
        Self {
            user_id: profile.id.clone(),
            handle: handle(&name),
            initials: initials(&name),
            display_name: name,
            bio: profile.bio.clone(),
            instagram: profile.instagram.clone(),
            avatar_url: profile.avatar_url.clone(),
            interests: profile.interests.clone(),
            follower_count: profile.follower_count,
            following_count: profile.following_count,
            is_host: profile.is_host,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationItem {
    pub id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub event_id: Option<String>,
    pub when: String,
    pub read: bool,
}

impl From<&Notification> for NotificationItem {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.clone(),
            kind: notification.kind,
            message: notification.message.clone(),
            event_id: notification.event_id.clone(),
            when: relative_time(notification.created_at, Utc::now()),
            read: notification.read,
        }
    }
}

/// Another user's profile, opened from an attendee or host chip.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSheet {
    pub summary: ProfileSummary,
    pub hosted: Vec<EventCard>,
    pub following: bool,
    pub is_self: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ProfileState {
    #[default]
    Loading,
    SignedOut,
    Ready(ProfileSummary),
    Error(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileModel {
    pub state: ProfileState,
    pub share_url: Option<String>,
    pub hosted: Vec<EventCard>,
    pub saved: Vec<EventCard>,
    pub notifications: Vec<NotificationItem>,
    pub user_sheet: Option<UserSheet>,
}

/// Edit-profile form input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileEdit {
    pub display_name: String,
    pub bio: String,
    pub instagram: String,
    /// Raw comma separated input.
    pub interests: String,
    pub avatar: Option<MediaUpload>,
}

#[derive(Debug, Default)]
pub struct ProfileView {
    model: Mutex<ProfileModel>,
}

impl ProfileView {
    pub fn model(&self) -> ProfileModel {
        lock(&self.model).clone()
    }

    pub(crate) fn reset(&self) {
        *lock(&self.model) = ProfileModel::default();
    }

    /// Loads hosted and saved events, then the notifications, then marks
    /// them read. A load that outlives its session writes nothing.
    pub async fn init<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<()> {
        let (session, epoch) = cx.store.read(|state| (state.session.clone(), state.epoch));
        let Some(session) = session else {
            *lock(&self.model) = ProfileModel {
                state: ProfileState::SignedOut,
                ..Default::default()
            };
            return Ok(());
        };
        let user_id = session.user_id().to_string();

        let loaded = async {
            let hosted_filters = EventFilters {
                limit: Some(cx.config.app.list_limit),
                ..EventFilters::hosted_by(user_id.as_str())
            };
            let (hosted, saved) = tokio::try_join!(cx.gateway.get_events(&hosted_filters), saved_events(cx))?;
            let notifications = cx.gateway.get_notifications(&user_id).await?;
            cx.gateway.mark_notifications_read(&user_id).await?;
            Ok::<_, AppError>((hosted, saved, notifications))
        }
        .await;

        if cx.store.epoch() != epoch {
            log::debug!("profile: dropping load for {user_id}: session changed");
            return Ok(());
        }
        let (hosted, saved, notifications) = match loaded {
            Ok(loaded) => loaded,
            Err(err) => {
                log::warn!("profile: loading failed: {err}");
                lock(&self.model).state = ProfileState::Error("Couldn't load profile".to_string());
                return Err(err);
            }
        };

        let share_url = LinkContext::new(&cx.config.app.share_base_url).profile_share_url().ok();
        if self.publish(cx.store, epoch, session.profile, (hosted, saved, notifications), share_url) {
            cx.ui.set_badge(0);
        }
        Ok(())
    }

    /// Writes a finished load into the model and zeroes the unread count,
    /// unless the session it started under has ended. The model lock is held
    /// across the epoch check, so a `reset` after sign-out is never overwritten.
    fn publish(
        &self,
        store: &Store,
        epoch: u64,
        fallback: Profile,
        (hosted, saved, notifications): (Vec<Event>, Vec<Event>, Vec<Notification>),
        share_url: Option<String>,
    ) -> bool {
        let mut model = lock(&self.model);
        let Some((memberships, profile)) = store.update(|state| {
            if state.epoch != epoch {
                return None;
            }
            state.unread_notifications = 0;
            let profile = state.session.as_ref().map(|s| s.profile.clone());
            Some((state.memberships.clone(), profile.unwrap_or(fallback)))
        }) else {
            log::debug!("profile: session changed before publish");
            return false;
        };

        model.state = ProfileState::Ready(ProfileSummary::new(&profile));
        model.share_url = share_url;
        model.hosted = cards(&hosted, &memberships);
        model.saved = cards(&saved, &memberships);
        model.notifications = notifications.iter().map(NotificationItem::from).collect();
        true
    }

    /// Fills the user sheet for `user_id`.
    pub async fn load_user<G: Gateway>(&self, cx: ViewContext<'_, G>, user_id: &str) -> AppResult<()> {
        let profile = cx
            .gateway
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(user_id))?;
        let hosted = cx.gateway.get_events(&EventFilters::hosted_by(user_id)).await?;
        let (memberships, me) = cx
            .store
            .read(|state| (state.memberships.clone(), state.user_id().map(str::to_string)));
        lock(&self.model).user_sheet = Some(UserSheet {
            summary: ProfileSummary::new(&profile),
            hosted: cards(&hosted, &memberships),
            following: memberships.contains(Membership::Follow, user_id),
            is_self: me.as_deref() == Some(user_id),
        });
        Ok(())
    }

    pub fn close_user(&self) {
        lock(&self.model).user_sheet = None;
    }

    /// Uploads the avatar if one was picked, then writes the profile row
    /// and replaces the cached profile.
    pub async fn save<G: Gateway>(&self, cx: ViewContext<'_, G>, edit: ProfileEdit) -> AppResult<Profile> {
        let user_id = cx.store.read(|state| state.user_id().map(str::to_string)).ok_or(AppError::Unauthenticated)?;
        let display_name = edit.display_name.trim();
        if display_name.is_empty() {
            return Err(ValidationError::single("display_name", "required", "Name can't be empty").into());
        }

        let avatar_url = match &edit.avatar {
            Some(upload) => {
                validate_upload(upload, cx.config.app.max_upload_size_mb)?;
                let url = cx.gateway.upload_avatar(&user_id, upload).await.map_err(|err| AppError::Upload {
                    message: err.to_string(),
                })?;
                Some(url)
            }
            None => None,
        };

        let patch = ProfilePatch {
            display_name: Some(display_name.to_string()),
            bio: Some(edit.bio.trim().to_string()),
            instagram: Some(edit.instagram.trim().trim_start_matches('@').to_string()).filter(|s| !s.is_empty()),
            interests: Some(parse_interests(&edit.interests)),
            avatar_url,
        };
        let profile = cx.gateway.update_user(&user_id, &patch).await?;
        cx.store.update(|state| {
            if let Some(session) = state.session.as_mut().filter(|s| s.user_id() == user_id) {
                session.profile = profile.clone();
            }
        });
        Ok(profile)
    }

    pub(crate) fn reflect(&self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        let mut guard = lock(&self.model);
        let model = &mut *guard;
        for card in model.hosted.iter_mut().chain(model.saved.iter_mut()) {
            card.reflect(kind, target_id, active, delta);
        }
        if kind == Membership::Save && !active {
            model.saved.retain(|card| card.id != target_id);
        }
        if kind == Membership::Follow {
            if let Some(sheet) = model.user_sheet.as_mut().filter(|s| s.summary.user_id == target_id) {
                sheet.following = active;
                sheet.summary.follower_count = (sheet.summary.follower_count + delta).max(0);
            }
            if let ProfileState::Ready(summary) = &mut model.state {
                summary.following_count = (summary.following_count + delta).max(0);
            }
        }
    }
}

/// Saved events, from the cache where possible.
async fn saved_events<G: Gateway>(cx: ViewContext<'_, G>) -> AppResult<Vec<Event>> {
    let (saved_ids, cached) = cx.store.read(|state| {
        let ids: Vec<String> = state.memberships.saved.iter().cloned().collect();
        let cached: Vec<Event> = ids.iter().filter_map(|id| state.event(id).cloned()).collect();
        (ids, cached)
    });
    let mut events = cached;
    for id in saved_ids {
        if events.iter().any(|e| e.id == id) {
            continue;
        }
        if let Some(event) = cx.gateway.get_event(&id).await? {
            events.push(event);
        }
    }
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(events)
}
