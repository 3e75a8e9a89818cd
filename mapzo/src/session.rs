//! Loading everything that depends on the signed-in identity.

use crate::errors::AppResult;
use crate::gateway::{Gateway, Membership};
use crate::models::{Identity, Profile};
use crate::state::{MembershipSets, Session};

/// Session data fetched before anything is published to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSession {
    pub session: Session,
    pub memberships: MembershipSets,
    pub unread: u32,
}

/// Profile first (creating the row on first sign-in), then the four
/// membership sets concurrently, then the unread count.
pub async fn load_session<G: Gateway>(gateway: &G, identity: &Identity) -> AppResult<LoadedSession> {
    let profile = ensure_profile(gateway, identity).await?;
    let uid = identity.uid.as_str();

    let (liked, saved, attending, following) = tokio::try_join!(
        gateway.memberships(Membership::Like, uid),
        gateway.memberships(Membership::Save, uid),
        gateway.memberships(Membership::Attend, uid),
        gateway.memberships(Membership::Follow, uid),
    )?;
    let unread = gateway.get_unread_count(uid).await?;

    log::debug!(
        "session {uid}: {} liked, {} saved, {} attending, {} following, {unread} unread",
        liked.len(),
        saved.len(),
        attending.len(),
        following.len()
    );
    Ok(LoadedSession {
        session: Session {
            identity: identity.clone(),
            profile,
        },
        memberships: MembershipSets {
            liked,
            saved,
            attending,
            following,
        },
        unread,
    })
}

async fn ensure_profile<G: Gateway>(gateway: &G, identity: &Identity) -> AppResult<Profile> {
    if let Some(profile) = gateway.get_user(&identity.uid).await? {
        return Ok(profile);
    }
    let profile = Profile::from_identity(identity);
    gateway.upsert_user(&profile).await?;
    log::info!("created profile for {}", identity.uid);
    Ok(profile)
}
