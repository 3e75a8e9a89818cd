//! The client application object.
//!
//! [`App`] owns the store, the router, the UI surfaces, the realtime bridge
//! and every controller, and is the only place where they meet. All of its
//! operations take `&self`, so user actions can overlap the way they do on
//! a single-threaded event loop.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::config::MapzoConfig;
use crate::errors::{AppError, AppResult, ValidationError};
use crate::gateway::{AuthProvider, ChannelSpec, FixedLocation, Gateway, Geolocator, Membership};
use crate::keys::LinkContext;
use crate::models::{Category, Comment, Event, EventDraft, HostRequest, Identity, Profile};
use crate::realtime::{RealtimeBridge, RealtimeUpdate, SubscriptionHandle};
use crate::router::{Activation, Route, Router, Tab, ViewStatus};
use crate::session::load_session;
use crate::state::Store;
use crate::sync::{ToggleCoordinator, ToggleKey, toast_text};
use crate::ui::{AuthMode, Sheet, Ui};
use crate::validators::{validate_comment, validate_sign_in, validate_sign_up};
use crate::views::host::HostMode;
use crate::views::profile::ProfileEdit;
use crate::views::{ViewContext, Views};

pub const SIGN_IN_PROMPT: &str = "Please sign in to continue";

pub struct App<G, A, L = FixedLocation> {
    config: MapzoConfig,
    gateway: G,
    auth: A,
    geolocator: L,
    store: Store,
    ui: Ui,
    router: Mutex<Router>,
    realtime: Mutex<RealtimeBridge>,
    toggles: ToggleCoordinator,
    views: Views,
}

impl<G, A, L> App<G, A, L>
where
    G: Gateway,
    A: AuthProvider,
    L: Geolocator,
{
    pub fn new(config: MapzoConfig, gateway: G, auth: A, geolocator: L) -> Self {
        let ui = Ui::new(config.app.toast_duration_ms);
        Self {
            config,
            gateway,
            auth,
            geolocator,
            store: Store::new(),
            ui,
            router: Mutex::new(Router::new()),
            realtime: Mutex::new(RealtimeBridge::new()),
            toggles: ToggleCoordinator::new(),
            views: Views::default(),
        }
    }

    pub fn config(&self) -> &MapzoConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn auth(&self) -> &A {
        &self.auth
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn ui(&self) -> &Ui {
        &self.ui
    }

    pub fn views(&self) -> &Views {
        &self.views
    }

    pub fn toggles(&self) -> &ToggleCoordinator {
        &self.toggles
    }

    fn cx(&self) -> ViewContext<'_, G> {
        ViewContext {
            gateway: &self.gateway,
            store: &self.store,
            ui: &self.ui,
            config: &self.config,
        }
    }

    fn router(&self) -> MutexGuard<'_, Router> {
        self.router.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn realtime(&self) -> MutexGuard<'_, RealtimeBridge> {
        self.realtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn route_status(&self, route: Route) -> ViewStatus {
        self.router().status(route)
    }

    pub fn active_route(&self) -> Option<Route> {
        self.router().active()
    }

    pub fn has_comment_channel(&self) -> bool {
        self.realtime().comments.is_open()
    }

    pub fn has_notification_channel(&self) -> bool {
        self.realtime().notifications.is_some()
    }

    // ---------------------------------------------------------------------
    // Lifecycle and routing
    // ---------------------------------------------------------------------

    /// Opens the new-event channel, restores a previous session and shows
    /// the route for `fragment`.
    pub async fn boot(&self, fragment: &str) -> Activation {
        match self.gateway.subscribe(ChannelSpec::NewEvents).await {
            Ok(subscription) => self.realtime().events = Some(SubscriptionHandle::new(subscription)),
            Err(err) => log::warn!("new-event channel unavailable: {err}"),
        }
        if let Some(identity) = self.auth.current() {
            if let Err(err) = self.on_auth_change(Some(identity)).await {
                log::warn!("restoring session failed: {err}");
            }
        }
        self.navigate(fragment).await
    }

    /// Tears every realtime channel down.
    pub fn shutdown(&self) {
        self.realtime().close_all();
    }

    /// Shows the route for `fragment`, running its initializer if it has not
    /// run yet (or was invalidated). Initializer failures stay in the view.
    pub async fn navigate(&self, fragment: &str) -> Activation {
        let (previous, activation) = {
            let mut router = self.router();
            let previous = router.active();
            let activation = self.store.update(|state| router.activate(fragment, &mut state.route));
            (previous, activation)
        };
        // Leaving the pane closes an open event sheet and its comment channel.
        if previous != Some(activation.route) && self.views.sheet.event_id().is_some() {
            self.close_event();
        }
        self.ui.show_pane(activation.route);
        if activation.run_initializer {
            if let Err(err) = self.initialize(activation.route).await {
                log::warn!("initializing {} failed: {err}", activation.route);
            }
        }
        activation
    }

    pub async fn navigate_tab(&self, tab: Tab) -> Activation {
        let route = {
            let router = self.router();
            self.store.read(|state| router.navigate_tab(tab, &state.route))
        };
        self.navigate(&route.fragment()).await
    }

    /// Invalidates `route` and re-shows it straight away if it is active.
    pub async fn refresh(&self, route: Route) -> Option<Activation> {
        let active = self.router().invalidate(route);
        if active { Some(self.navigate(&route.fragment()).await) } else { None }
    }

    async fn initialize(&self, route: Route) -> AppResult<()> {
        log::debug!("initializing {route}");
        let cx = self.cx();
        match route {
            Route::Map => self.views.map.init(cx, &self.geolocator).await,
            Route::Feed => self.views.feed.init(cx).await.map(|_| ()),
            Route::List => self.views.list.init(cx).await,
            Route::Explore => self.views.explore.init(cx).await,
            Route::Social => self.views.social.init(cx).await,
            Route::Profile => self.views.profile.init(cx).await,
        }
    }

    // ---------------------------------------------------------------------
    // Session
    // ---------------------------------------------------------------------

    /// Returns the signed-in identity, or opens the sign-in prompt.
    pub fn require_auth(&self) -> AppResult<Identity> {
        match self.store.identity() {
            Some(identity) => Ok(identity),
            None => {
                self.ui.open_auth(AuthMode::Login);
                self.ui.toast(SIGN_IN_PROMPT);
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// Applies an auth-state change delivered by the provider.
    ///
    /// On sign-in nothing is written to the store until the profile, the
    /// membership sets and the unread count have all been fetched.
    pub async fn on_auth_change(&self, identity: Option<Identity>) -> AppResult<()> {
        match identity {
            Some(identity) => {
                let loaded = load_session(&self.gateway, &identity).await?;
                let channel = ChannelSpec::Notifications {
                    user_id: identity.uid.clone(),
                };
                let handle = match self.gateway.subscribe(channel).await {
                    Ok(subscription) => Some(SubscriptionHandle::new(subscription)),
                    Err(err) => {
                        log::warn!("notification channel unavailable: {err}");
                        None
                    }
                };
                let unread = loaded.unread;
                self.store
                    .update(|state| state.begin_session(loaded.session, loaded.memberships, unread));
                self.realtime().notifications = handle;
                self.ui.set_badge(unread);
                log::info!("signed in as {}", identity.uid);
            }
            None => {
                self.store.update(|state| state.end_session());
                self.realtime().notifications = None;
                self.ui.set_badge(0);
                self.views.clear_session();
                log::info!("signed out");
            }
        }
        for route in [Route::Social, Route::Profile] {
            self.refresh(route).await;
        }
        Ok(())
    }

    fn auth_failed(&self, err: AppError) -> AppError {
        self.ui.set_auth_error(err.user_message());
        err
    }

    async fn finish_sign_in(&self, identity: Identity) -> AppResult<Identity> {
        self.on_auth_change(Some(identity.clone()))
            .await
            .map_err(|err| self.auth_failed(err))?;
        let name = self
            .store
            .read(|state| state.session.as_ref().map(|s| s.display_name().to_string()))
            .unwrap_or_default();
        self.ui.close_auth();
        self.ui.toast(format!("👋 Welcome, {name}!"));
        Ok(identity)
    }

    pub async fn sign_in_email(&self, email: &str, password: &str) -> AppResult<Identity> {
        validate_sign_in(email, password).map_err(|err| self.auth_failed(err.into()))?;
        let identity = self
            .auth
            .sign_in_email(email.trim(), password)
            .await
            .map_err(|err| self.auth_failed(err))?;
        self.finish_sign_in(identity).await
    }

    pub async fn sign_up_email(&self, display_name: &str, email: &str, password: &str) -> AppResult<Identity> {
        validate_sign_up(display_name, email, password).map_err(|err| self.auth_failed(err.into()))?;
        let identity = self
            .auth
            .sign_up_email(email.trim(), password, display_name.trim())
            .await
            .map_err(|err| self.auth_failed(err))?;
        self.finish_sign_in(identity).await
    }

    pub async fn sign_in_federated(&self) -> AppResult<Identity> {
        let identity = self
            .auth
            .sign_in_federated()
            .await
            .map_err(|err| self.auth_failed(err))?;
        self.finish_sign_in(identity).await
    }

    pub async fn sign_out(&self) -> AppResult<()> {
        if let Err(err) = self.auth.sign_out().await {
            self.ui.toast(err.user_message());
            return Err(err);
        }
        self.on_auth_change(None).await?;
        self.ui.toast("Signed out");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Toggles
    // ---------------------------------------------------------------------

    /// Flips the session user's `kind` membership for `target_id`.
    ///
    /// Signed out, this only opens the sign-in prompt. Toggles racing on
    /// the same target settle one after another, so the final local state is
    /// the answer to the last one issued.
    pub async fn toggle(&self, kind: Membership, target_id: &str) -> AppResult<bool> {
        let identity = self.require_auth()?;
        if kind.targets_user() && identity.uid == target_id {
            let err = AppError::from(ValidationError::single("target", "self", "You can't follow yourself"));
            self.ui.toast(err.user_message());
            return Err(err);
        }
        let key = ToggleKey::new(&identity.uid, kind, target_id);
        self.toggles
            .run(key, self.settle_toggle(&identity, kind, target_id))
            .await
    }

    async fn settle_toggle(&self, identity: &Identity, kind: Membership, target_id: &str) -> AppResult<bool> {
        let policy = self.config.sync.toggle_policy;
        let epoch = self.store.epoch();
        let before = self.store.contains(kind, target_id);
        if policy.flips_eagerly() {
            self.apply_membership(kind, target_id, !before);
        }

        let result = self.gateway.toggle(identity, kind, target_id).await;
        if self.store.epoch() != epoch {
            log::debug!("dropping {kind} result for {target_id}: session changed");
            return result;
        }

        match result {
            Ok(active) => {
                self.apply_membership(kind, target_id, active);
                if let Some(text) = toast_text(kind, active) {
                    self.ui.toast(text);
                }
                Ok(active)
            }
            Err(err) => {
                log::warn!("{kind} toggle for {target_id} failed: {err}");
                if policy.flips_eagerly() {
                    self.apply_membership(kind, target_id, before);
                }
                self.ui.toast(err.user_message());
                Err(err)
            }
        }
    }

    fn apply_membership(&self, kind: Membership, target_id: &str, active: bool) {
        let delta = self
            .store
            .update(|state| state.apply_membership(kind, target_id, active));
        if let Some(delta) = delta {
            self.views.reflect(kind, target_id, active, delta);
        }
    }

    // ---------------------------------------------------------------------
    // Realtime
    // ---------------------------------------------------------------------

    /// Folds every pending realtime message in; returns how many there were.
    pub fn pump_realtime(&self) -> usize {
        let updates = self.realtime().drain();
        let count = updates.len();
        for update in updates {
            match update {
                RealtimeUpdate::NewEvent(event) => {
                    self.store.update(|state| state.prepend_event(event.clone()));
                    if self.route_status(Route::Map) == ViewStatus::Ready {
                        self.views.map.add_pin(&event);
                    }
                }
                RealtimeUpdate::NewComment(comment) => {
                    let me = self.store.read(|state| state.user_id().map(str::to_string));
                    self.views.sheet.prepend_comment(&comment, me.as_deref());
                }
                RealtimeUpdate::Notification(notification) => {
                    let unread = self.store.update(|state| {
                        state.unread_notifications = state.unread_notifications.saturating_add(1);
                        state.unread_notifications
                    });
                    self.ui.set_badge(unread);
                    self.ui.toast(format!("🔔 {}", notification.message));
                }
            }
        }
        count
    }

    // ---------------------------------------------------------------------
    // Map
    // ---------------------------------------------------------------------

    pub fn filter_map(&self, category: &str) -> usize {
        self.views.map.set_filter(category)
    }

    pub fn preview_pin(&self, event_id: &str) -> AppResult<()> {
        let event = self
            .store
            .read(|state| state.event(event_id).cloned())
            .ok_or_else(|| AppError::not_found(event_id))?;
        self.views.map.show_preview(&event);
        Ok(())
    }

    pub async fn load_more_feed(&self) -> AppResult<usize> {
        self.views.feed.load_more(self.cx()).await
    }

    /// Lists only `category` and switches to the list view.
    pub async fn browse_category(&self, category: Category) -> Activation {
        let meta = category.meta();
        self.ui.toast(format!("{} Browsing {}", meta.emoji, category.name()));
        self.views.list.set_category(Some(category));
        self.router().invalidate(Route::List);
        self.navigate(&Route::List.fragment()).await
    }

    // ---------------------------------------------------------------------
    // Event sheet
    // ---------------------------------------------------------------------

    /// Opens the detail sheet and, once loaded, its comment channel.
    pub async fn open_event(&self, event_id: &str) -> AppResult<()> {
        let sheet = Sheet::Event {
            event_id: event_id.to_string(),
        };
        self.realtime().comments.close();
        self.ui.open_sheet(sheet.clone());

        match self.views.sheet.open(self.cx(), event_id).await {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(err) => {
                log::warn!("loading event {event_id} failed: {err}");
                self.ui.close_sheet_if(&sheet);
                self.ui.toast("Failed to load event");
                return Err(err);
            }
        }

        let channel = ChannelSpec::Comments {
            event_id: event_id.to_string(),
        };
        match self.gateway.subscribe(channel).await {
            // Dropping the subscription unsubscribes if the sheet moved on meanwhile.
            Ok(subscription) if self.views.sheet.is_showing(event_id) => {
                self.realtime()
                    .comments
                    .open(event_id, SubscriptionHandle::new(subscription));
            }
            Ok(_) => {}
            Err(err) => log::warn!("comment channel for {event_id} unavailable: {err}"),
        }
        Ok(())
    }

    pub fn close_event(&self) {
        if let Some(event_id) = self.views.sheet.event_id() {
            self.ui.close_sheet_if(&Sheet::Event { event_id });
        }
        self.views.sheet.close();
        self.realtime().comments.close();
    }

    pub async fn submit_comment(&self, text: &str, rating: Option<u8>) -> AppResult<Comment> {
        let identity = self.require_auth()?;
        let event_id = self.views.sheet.event_id().ok_or_else(|| AppError::InvalidRequest {
            message: "No event open".to_string(),
        })?;
        let (text, rating) = match validate_comment(text, rating) {
            Ok(valid) => valid,
            Err(err) => {
                let err = AppError::from(err);
                self.ui.set_form_error("comment", err.user_message());
                self.ui.toast(err.user_message());
                return Err(err);
            }
        };

        match self.gateway.add_comment(&identity, &event_id, &text, rating).await {
            Ok(comment) => {
                self.views.sheet.prepend_comment(&comment, Some(&identity.uid));
                self.ui.clear_form_error("comment");
                Ok(comment)
            }
            Err(err) => {
                self.ui.toast(err.user_message());
                Err(err)
            }
        }
    }

    /// Removes the comment from the sheet once the remote delete succeeded.
    pub async fn delete_comment(&self, comment_id: &str) -> AppResult<()> {
        let identity = self.require_auth()?;
        if let Err(err) = self.gateway.delete_comment(&identity.uid, comment_id).await {
            self.ui.toast(err.user_message());
            return Err(err);
        }
        self.views.sheet.remove_comment(comment_id);
        self.ui.toast("Comment deleted");
        Ok(())
    }

    pub fn share_event(&self, event_id: &str) -> AppResult<String> {
        let url = LinkContext::new(&self.config.app.share_base_url).event_share_url(event_id)?;
        self.ui.toast("🔗 Link copied!");
        Ok(url)
    }

    pub fn directions(&self, event_id: &str) -> AppResult<String> {
        let location = match self.views.sheet.detail().filter(|d| d.event_id == event_id) {
            Some(detail) => Some((detail.lat, detail.lng)),
            None => self.store.read(|state| state.event(event_id).map(|e| (e.lat, e.lng))),
        };
        let (lat, lng) = location.ok_or_else(|| AppError::not_found(event_id))?;
        Ok(LinkContext::directions_url(lat, lng))
    }

    /// Free events are joined directly; paid ones only announce payments.
    pub async fn buy_ticket(&self, event_id: &str) -> AppResult<()> {
        let is_free = match self.views.sheet.detail().filter(|d| d.event_id == event_id) {
            Some(detail) => Some(detail.is_free),
            None => self.store.read(|state| state.event(event_id).map(Event::is_free)),
        }
        .ok_or_else(|| AppError::not_found(event_id))?;
        if is_free {
            self.toggle(Membership::Attend, event_id).await.map(|_| ())
        } else {
            self.ui.toast("💳 Ticket payments coming soon!");
            Ok(())
        }
    }

    // ---------------------------------------------------------------------
    // Profiles
    // ---------------------------------------------------------------------

    pub async fn open_user(&self, user_id: &str) -> AppResult<()> {
        let sheet = Sheet::User {
            user_id: user_id.to_string(),
        };
        self.ui.open_sheet(sheet.clone());
        if let Err(err) = self.views.profile.load_user(self.cx(), user_id).await {
            log::warn!("loading user {user_id} failed: {err}");
            self.ui.close_sheet_if(&sheet);
            self.ui.toast("Failed to load profile");
            return Err(err);
        }
        Ok(())
    }

    pub fn close_user(&self) {
        if let Some(Sheet::User { user_id }) = self.ui.sheet() {
            self.ui.close_sheet_if(&Sheet::User { user_id });
        }
        self.views.profile.close_user();
    }

    pub fn open_edit_profile(&self) -> AppResult<()> {
        self.require_auth()?;
        self.ui.open_sheet(Sheet::EditProfile);
        Ok(())
    }

    pub async fn save_profile(&self, edit: ProfileEdit) -> AppResult<Profile> {
        self.require_auth()?;
        let profile = match self.views.profile.save(self.cx(), edit).await {
            Ok(profile) => profile,
            Err(err) => {
                self.ui.set_form_error("profile", err.user_message());
                return Err(err);
            }
        };
        self.ui.clear_form_error("profile");
        self.ui.close_sheet_if(&Sheet::EditProfile);
        self.ui.toast("✅ Profile updated!");
        self.refresh(Route::Profile).await;
        Ok(profile)
    }

    // ---------------------------------------------------------------------
    // Hosting
    // ---------------------------------------------------------------------

    /// The Host button: verification form for non-hosts, create form for hosts.
    pub fn open_host(&self) -> AppResult<HostMode> {
        self.require_auth()?;
        let is_host = self
            .store
            .read(|state| state.session.as_ref().is_some_and(|s| s.profile.is_host));
        let mode = self.views.host.open(is_host);
        self.ui.open_sheet(match mode {
            HostMode::Create => Sheet::CreateEvent,
            HostMode::Verify => Sheet::HostRequest,
        });
        Ok(mode)
    }

    pub async fn submit_host_request(&self, request: &HostRequest) -> AppResult<()> {
        let identity = self.require_auth()?;
        if let Err(err) = self.views.host.submit_request(self.cx(), &identity, request).await {
            self.ui.set_form_error("host_request", err.user_message());
            return Err(err);
        }
        self.ui.clear_form_error("host_request");
        self.ui.close_sheet_if(&Sheet::HostRequest);
        self.views.host.close();
        self.ui.toast("✅ Request submitted! We'll review it soon.");
        Ok(())
    }

    pub async fn publish_event(&self, draft: EventDraft) -> AppResult<Event> {
        let identity = self.require_auth()?;
        let is_host = self
            .store
            .read(|state| state.session.as_ref().is_some_and(|s| s.profile.is_host));
        if !is_host {
            let err = AppError::InvalidRequest {
                message: "Only verified hosts can publish events".to_string(),
            };
            self.ui.toast(err.user_message());
            return Err(err);
        }

        let event = match self.views.host.publish(self.cx(), &identity, draft).await {
            Ok(event) => event,
            Err(err) => {
                self.ui.set_form_error("create_event", err.user_message());
                self.ui.toast(err.user_message());
                return Err(err);
            }
        };

        if self.route_status(Route::Map) == ViewStatus::Ready {
            self.views.map.add_pin(&event);
        }
        {
            let mut router = self.router();
            router.invalidate(Route::Feed);
            router.invalidate(Route::List);
        }
        self.ui.clear_form_error("create_event");
        self.ui.close_sheet_if(&Sheet::CreateEvent);
        self.views.host.close();
        self.ui.toast("🎉 Event published!");
        Ok(event)
    }
}
