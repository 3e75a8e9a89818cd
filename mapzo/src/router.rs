//! Fragment router.
//!
//! Maps `#feed`-style fragments onto the fixed set of views and tracks,
//! per view, whether its initializer still has to run.

use std::collections::HashMap;
use std::fmt;

use crate::state::RouteState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Route {
    Map,
    Feed,
    List,
    Explore,
    Social,
    Profile,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Map,
        Route::Feed,
        Route::List,
        Route::Explore,
        Route::Social,
        Route::Profile,
    ];

    pub const DEFAULT: Route = Route::Map;

    pub fn name(self) -> &'static str {
        match self {
            Route::Map => "map",
            Route::Feed => "feed",
            Route::List => "list",
            Route::Explore => "explore",
            Route::Social => "social",
            Route::Profile => "profile",
        }
    }

    pub fn fragment(self) -> String {
        format!("#{}", self.name())
    }

    pub fn tab(self) -> Tab {
        match self {
            Route::Map | Route::Feed | Route::List => Tab::Discover,
            Route::Explore => Tab::Explore,
            Route::Social => Tab::Social,
            Route::Profile => Tab::Profile,
        }
    }

    /// Sub-views of the Discover tab share the map/feed/list switcher.
    pub fn is_discover(self) -> bool {
        self.tab() == Tab::Discover
    }

    /// `#feed`, `feed` and `` (the default) resolve; anything else is `None`.
    pub fn parse(fragment: &str) -> Option<Route> {
        let name = fragment.trim().trim_start_matches('#');
        if name.is_empty() {
            return Some(Route::DEFAULT);
        }
        Route::ALL.into_iter().find(|route| route.name() == name)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Discover,
    Explore,
    Social,
    Profile,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Discover, Tab::Explore, Tab::Social, Tab::Profile];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Discover => "Discover",
            Tab::Explore => "Explore",
            Tab::Social => "Social",
            Tab::Profile => "Profile",
        }
    }
}

/// Lifecycle of one view's data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ViewStatus {
    #[default]
    Uninitialized,
    Ready,
    /// Initialized once but must reload on its next activation.
    Stale,
}

/// Outcome of [`Router::activate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub route: Route,
    pub tab: Tab,
    /// The unknown fragment that was replaced by the default route.
    pub redirected_from: Option<String>,
    /// The caller must run the route's initializer.
    pub run_initializer: bool,
    pub show_view_switcher: bool,
}

#[derive(Debug, Default)]
pub struct Router {
    statuses: HashMap<Route, ViewStatus>,
    active: Option<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, route: Route) -> ViewStatus {
        self.statuses.get(&route).copied().unwrap_or_default()
    }

    pub fn active(&self) -> Option<Route> {
        self.active
    }

    /// Resolves `fragment` and makes it the active route.
    ///
    /// The route is marked `Ready` here, before its initializer runs, so a
    /// second activation while the first load is still pending does not
    /// start another one. A failed initializer keeps its own error state.
    pub fn activate(&mut self, fragment: &str, route_state: &mut RouteState) -> Activation {
        let (route, redirected_from) = match Route::parse(fragment) {
            Some(route) => (route, None),
            None => {
                log::debug!("unknown route {fragment:?}, showing {}", Route::DEFAULT);
                (Route::DEFAULT, Some(fragment.to_string()))
            }
        };

        let status = self.statuses.entry(route).or_default();
        let run_initializer = *status != ViewStatus::Ready;
        *status = ViewStatus::Ready;

        route_state.current_tab = route.tab();
        if route.is_discover() {
            route_state.current_view = route;
        }
        self.active = Some(route);

        Activation {
            route,
            tab: route.tab(),
            redirected_from,
            run_initializer,
            show_view_switcher: route.is_discover(),
        }
    }

    /// Forces `route`'s initializer to run again on its next activation.
    /// Returns whether `route` is the one currently shown.
    pub fn invalidate(&mut self, route: Route) -> bool {
        if let Some(status) = self.statuses.get_mut(&route) {
            if *status == ViewStatus::Ready {
                *status = ViewStatus::Stale;
            }
        }
        self.active == Some(route)
    }

    /// Route a tab-bar tap leads to.
    pub fn navigate_tab(&self, tab: Tab, route_state: &RouteState) -> Route {
        match tab {
            Tab::Discover => route_state.current_view,
            Tab::Explore => Route::Explore,
            Tab::Social => Route::Social,
            Tab::Profile => Route::Profile,
        }
    }
}
