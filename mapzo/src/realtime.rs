//! Ownership of the realtime push channels.
//!
//! Each channel is held by a [`SubscriptionHandle`]; dropping or closing the
//! handle tears the channel down, so a view that goes away cannot leak one.

use crate::gateway::{ChannelSpec, RealtimePayload, Subscription};
use crate::models::{Comment, Event, Notification};

/// Owns one live subscription.
#[derive(Debug)]
pub struct SubscriptionHandle {
    subscription: Option<Subscription>,
}

impl SubscriptionHandle {
    pub fn new(subscription: Subscription) -> Self {
        log::debug!("subscribed to {}", subscription.channel.name());
        Self {
            subscription: Some(subscription),
        }
    }

    pub fn channel(&self) -> Option<&ChannelSpec> {
        self.subscription.as_ref().map(|s| &s.channel)
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn close(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            log::debug!("unsubscribed from {}", subscription.channel.name());
        }
    }

    fn drain(&mut self) -> Vec<RealtimePayload> {
        let mut payloads = Vec::new();
        if let Some(subscription) = self.subscription.as_mut() {
            while let Some(payload) = subscription.try_next() {
                payloads.push(payload);
            }
        }
        payloads
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

/// Comment channel of the event sheet; at most one is open.
#[derive(Debug, Default)]
pub enum CommentChannel {
    #[default]
    Closed,
    Open {
        event_id: String,
        handle: SubscriptionHandle,
    },
}

impl CommentChannel {
    /// Replaces whatever channel was open with `handle` for `event_id`.
    pub fn open(&mut self, event_id: impl Into<String>, handle: SubscriptionHandle) {
        self.close();
        *self = CommentChannel::Open {
            event_id: event_id.into(),
            handle,
        };
    }

    pub fn close(&mut self) {
        if let CommentChannel::Open { mut handle, .. } = std::mem::take(self) {
            handle.close();
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            CommentChannel::Closed => None,
            CommentChannel::Open { event_id, .. } => Some(event_id),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, CommentChannel::Open { .. })
    }
}

/// Message folded into the client state by `App::pump_realtime`.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeUpdate {
    NewEvent(Event),
    NewComment(Comment),
    Notification(Notification),
}

#[derive(Debug, Default)]
pub struct RealtimeBridge {
    pub events: Option<SubscriptionHandle>,
    pub comments: CommentChannel,
    pub notifications: Option<SubscriptionHandle>,
}

impl RealtimeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message waiting on the open channels, without blocking.
    ///
    /// Payloads arriving on the wrong channel are dropped, as are comments
    /// for an event other than the one whose channel is open.
    pub fn drain(&mut self) -> Vec<RealtimeUpdate> {
        let mut updates = Vec::new();

        if let Some(handle) = self.events.as_mut() {
            updates.extend(handle.drain().into_iter().filter_map(|payload| match payload {
                RealtimePayload::Events(event) => Some(RealtimeUpdate::NewEvent(event)),
                _ => None,
            }));
        }

        if let CommentChannel::Open { event_id, handle } = &mut self.comments {
            updates.extend(handle.drain().into_iter().filter_map(|payload| match payload {
                RealtimePayload::Comments(comment) if comment.event_id == *event_id => {
                    Some(RealtimeUpdate::NewComment(comment))
                }
                _ => None,
            }));
        }

        if let Some(handle) = self.notifications.as_mut() {
            updates.extend(handle.drain().into_iter().filter_map(|payload| match payload {
                RealtimePayload::Notifications(notification) => Some(RealtimeUpdate::Notification(notification)),
                _ => None,
            }));
        }

        updates
    }

    /// Drops every channel.
    pub fn close_all(&mut self) {
        self.events = None;
        self.comments.close();
        self.notifications = None;
    }
}
