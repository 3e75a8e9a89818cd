use std::sync::Mutex;

use crate::errors::AppResult;
use crate::gateway::{Gateway, Membership};
use crate::models::EventFilters;

use super::{EventCard, ViewContext, cards, lock};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedModel {
    pub cards: Vec<EventCard>,
    pub offset: usize,
    pub loading: bool,
    pub all_loaded: bool,
    /// The very first page came back empty.
    pub empty: bool,
    pub error: Option<String>,
}

/// Infinite-scroll feed, paged by offset.
#[derive(Debug, Default)]
pub struct FeedView {
    model: Mutex<FeedModel>,
}

impl FeedView {
    pub fn model(&self) -> FeedModel {
        lock(&self.model).clone()
    }

    /// Starts over from the first page.
    pub async fn init<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<usize> {
        *lock(&self.model) = FeedModel::default();
        self.load_more(cx).await
    }

    /// Appends the next page. A call while a page is loading, or after the
    /// last page, does nothing and returns 0.
    pub async fn load_more<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<usize> {
        let page_size = cx.config.app.feed_page_size;
        let offset = {
            let mut model = lock(&self.model);
            if model.loading || model.all_loaded {
                return Ok(0);
            }
            model.loading = true;
            model.offset
        };

        let result = cx.gateway.get_events(&EventFilters::page(page_size, offset)).await;
        let memberships = cx.store.read(|state| state.memberships.clone());

        let mut model = lock(&self.model);
        model.loading = false;
        let events = match result {
            Ok(events) => events,
            Err(err) => {
                log::warn!("feed: page at offset {offset} failed: {err}");
                model.error = Some("Couldn't load events".to_string());
                return Err(err);
            }
        };
        model.error = None;
        if events.len() < page_size {
            model.all_loaded = true;
        }
        if events.is_empty() && offset == 0 {
            model.empty = true;
        }
        model.offset += events.len();
        let fresh: Vec<EventCard> = cards(&events, &memberships)
            .into_iter()
            .filter(|card| !model.cards.iter().any(|c| c.id == card.id))
            .collect();
        let added = fresh.len();
        model.cards.extend(fresh);
        Ok(added)
    }

    pub(crate) fn reflect(&self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        for card in &mut lock(&self.model).cards {
            card.reflect(kind, target_id, active, delta);
        }
    }
}
