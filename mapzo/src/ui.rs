//! Transient UI surfaces: toasts, the auth prompt, sheets, the badge and
//! pane visibility. Plain data, no rendering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::format::badge_text;
use crate::router::{Route, Tab};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    SignUp,
}

/// Bottom sheet currently covering the panes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sheet {
    Event { event_id: String },
    User { user_id: String },
    CreateEvent,
    HostRequest,
    EditProfile,
}

/// Exactly one pane is visible; each keeps its own scroll offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panes {
    pub visible: Route,
    pub active_tab: Tab,
    pub view_switcher: bool,
    scroll: HashMap<Route, u32>,
}

impl Default for Panes {
    fn default() -> Self {
        Self {
            visible: Route::DEFAULT,
            active_tab: Route::DEFAULT.tab(),
            view_switcher: true,
            scroll: HashMap::new(),
        }
    }
}

impl Panes {
    /// Shows `route`'s pane alone and scrolls it back to the top.
    pub fn show(&mut self, route: Route) {
        self.visible = route;
        self.active_tab = route.tab();
        self.view_switcher = route.is_discover();
        self.scroll.insert(route, 0);
    }

    pub fn is_visible(&self, route: Route) -> bool {
        self.visible == route
    }

    pub fn scroll_offset(&self, route: Route) -> u32 {
        self.scroll.get(&route).copied().unwrap_or(0)
    }

    pub fn set_scroll(&mut self, route: Route, offset: u32) {
        self.scroll.insert(route, offset);
    }
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub toasts: Vec<Toast>,
    pub auth_prompt: Option<AuthMode>,
    pub auth_error: Option<String>,
    pub badge: String,
    pub sheet: Option<Sheet>,
    pub scroll_locked: bool,
    /// Inline error per form, keyed by form name.
    pub form_errors: HashMap<String, String>,
    pub panes: Panes,
}

/// Shared handle to the [`UiState`].
#[derive(Debug, Clone)]
pub struct Ui {
    inner: Arc<Mutex<UiState>>,
    toast_duration_ms: u64,
}

impl Ui {
    pub fn new(toast_duration_ms: u64) -> Self {
        Self {
            inner: Arc::default(),
            toast_duration_ms,
        }
    }

    fn lock(&self) -> MutexGuard<'_, UiState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> UiState {
        self.lock().clone()
    }

    pub fn toast(&self, message: impl Into<String>) {
        let toast = Toast {
            message: message.into(),
            duration_ms: self.toast_duration_ms,
        };
        log::info!("toast: {}", toast.message);
        self.lock().toasts.push(toast);
    }

    /// The visible toast.
    pub fn last_toast(&self) -> Option<String> {
        self.lock().toasts.last().map(|t| t.message.clone())
    }

    pub fn toasts(&self) -> Vec<String> {
        self.lock().toasts.iter().map(|t| t.message.clone()).collect()
    }

    pub fn open_auth(&self, mode: AuthMode) {
        let mut state = self.lock();
        state.auth_prompt = Some(mode);
        state.auth_error = None;
    }

    pub fn close_auth(&self) {
        let mut state = self.lock();
        state.auth_prompt = None;
        state.auth_error = None;
    }

    pub fn auth_prompt(&self) -> Option<AuthMode> {
        self.lock().auth_prompt
    }

    pub fn set_auth_error(&self, message: impl Into<String>) {
        self.lock().auth_error = Some(message.into());
    }

    pub fn auth_error(&self) -> Option<String> {
        self.lock().auth_error.clone()
    }

    pub fn set_badge(&self, unread: u32) {
        self.lock().badge = badge_text(unread);
    }

    pub fn badge(&self) -> String {
        self.lock().badge.clone()
    }

    /// Opens `sheet` over the panes and locks background scrolling.
    pub fn open_sheet(&self, sheet: Sheet) {
        let mut state = self.lock();
        state.sheet = Some(sheet);
        state.scroll_locked = true;
    }

    /// Closes the sheet if it is still `sheet`.
    pub fn close_sheet_if(&self, sheet: &Sheet) {
        let mut state = self.lock();
        if state.sheet.as_ref() == Some(sheet) {
            state.sheet = None;
            state.scroll_locked = false;
        }
    }

    pub fn close_sheet(&self) {
        let mut state = self.lock();
        state.sheet = None;
        state.scroll_locked = false;
    }

    pub fn sheet(&self) -> Option<Sheet> {
        self.lock().sheet.clone()
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.lock().scroll_locked
    }

    pub fn set_form_error(&self, form: &str, message: impl Into<String>) {
        self.lock().form_errors.insert(form.to_string(), message.into());
    }

    pub fn clear_form_error(&self, form: &str) {
        self.lock().form_errors.remove(form);
    }

    pub fn form_error(&self, form: &str) -> Option<String> {
        self.lock().form_errors.get(form).cloned()
    }

    pub fn show_pane(&self, route: Route) {
        self.lock().panes.show(route);
    }

    pub fn panes(&self) -> Panes {
        self.lock().panes.clone()
    }

    pub fn set_scroll(&self, route: Route, offset: u32) {
        self.lock().panes.set_scroll(route, offset);
    }
}
