//! Mapzo client core.
//!
//! Routing, session state, optimistic membership toggles and realtime
//! folding for the Mapzo event-discovery app. Hosted platforms are reached
//! through the traits in [`gateway`]; [`gateway::memory`] implements them
//! in-process.

pub mod app;
pub mod config;
pub mod errors;
pub mod format;
pub mod gateway;
pub mod id;
pub mod keys;
pub mod models;
pub mod realtime;
pub mod router;
pub mod session;
pub mod state;
pub mod sync;
pub mod ui;
pub mod validators;
pub mod views;

pub use app::App;
pub use config::MapzoConfig;
pub use errors::*;
pub use gateway::{AuthProvider, ChannelSpec, Gateway, Geolocator, Membership, RealtimePayload, Subscription};
pub use router::{Activation, Route, Router, Tab, ViewStatus};
pub use state::{AppState, MembershipSets, Session, Store};
pub use sync::{ToggleCoordinator, TogglePolicy};
pub use ui::{AuthMode, Sheet, Ui};
