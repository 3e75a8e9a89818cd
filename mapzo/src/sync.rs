//! Optimistic toggles of the per-session membership relations.
//!
//! Every like/save/attend/follow goes through [`ToggleCoordinator::run`],
//! which serializes racing toggles on the same (user, kind, target) key so
//! their remote results settle in the order they were issued.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::gateway::Membership;

/// When the local membership set changes relative to the remote call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TogglePolicy {
    /// Flip locally first, reconcile to the remote answer, roll back on failure.
    #[default]
    Optimistic,
    /// Change nothing locally until the remote answer arrives.
    Confirmed,
}

impl TogglePolicy {
    pub fn flips_eagerly(self) -> bool {
        matches!(self, TogglePolicy::Optimistic)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ToggleKey {
    pub user_id: String,
    pub kind: Membership,
    pub target_id: String,
}

impl ToggleKey {
    pub fn new(user_id: &str, kind: Membership, target_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            target_id: target_id.to_string(),
        }
    }
}

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Per-key in-flight guard.
#[derive(Debug, Default)]
pub struct ToggleCoordinator {
    slots: Mutex<HashMap<ToggleKey, Slot>>,
}

impl ToggleCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ToggleKey, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `work` once every earlier toggle on `key` has settled.
    ///
    /// `work` is not polled before the key is acquired, so any state it reads
    /// on its first poll already reflects the previous toggle's result.
    pub async fn run<F>(&self, key: ToggleKey, work: F) -> F::Output
    where
        F: Future,
    {
        let lease = Lease::acquire(self, key);
        let _guard = lease.slot.lock().await;
        work.await
    }

    /// Keys with a toggle in flight or waiting.
    pub fn in_flight(&self) -> usize {
        self.slots().len()
    }
}

struct Lease<'a> {
    coordinator: &'a ToggleCoordinator,
    key: ToggleKey,
    slot: Slot,
}

impl<'a> Lease<'a> {
    fn acquire(coordinator: &'a ToggleCoordinator, key: ToggleKey) -> Self {
        let slot = coordinator.slots().entry(key.clone()).or_default().clone();
        Self { coordinator, key, slot }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        let mut slots = self.coordinator.slots();
        // The map and this lease are the last two owners.
        if Arc::strong_count(&self.slot) <= 2 {
            slots.remove(&self.key);
        }
    }
}

/// Toast shown once a toggle settles; likes are silent.
pub fn toast_text(kind: Membership, active: bool) -> Option<&'static str> {
    match (kind, active) {
        (Membership::Like, _) => None,
        (Membership::Save, true) => Some("✅ Event saved!"),
        (Membership::Save, false) => Some("🔖 Removed from saved"),
        (Membership::Attend, true) => Some("✅ RSVP confirmed!"),
        (Membership::Attend, false) => Some("Removed from going"),
        (Membership::Follow, true) => Some("✅ Following!"),
        (Membership::Follow, false) => Some("Unfollowed"),
    }
}
