use std::sync::Mutex;

use crate::errors::AppResult;
use crate::gateway::{Gateway, Membership};
use crate::models::{Category, EventFilters};

use super::{EventCard, ViewContext, cards, lock};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListModel {
    pub rows: Vec<EventCard>,
    /// Set from the Explore grid; `None` lists everything.
    pub category: Option<Category>,
    pub empty: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ListView {
    model: Mutex<ListModel>,
}

impl ListView {
    pub fn model(&self) -> ListModel {
        lock(&self.model).clone()
    }

    pub fn set_category(&self, category: Option<Category>) {
        lock(&self.model).category = category;
    }

    /// Lists the cached events, fetching `list_limit` of them if the cache is empty.
    pub async fn init<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<()> {
        let cached = cx.store.read(|state| state.events.clone());
        let events = if cached.is_empty() {
            match cx.gateway.get_events(&EventFilters::limit(cx.config.app.list_limit)).await {
                Ok(events) => {
                    cx.store.update(|state| state.replace_events(events.clone()));
                    events
                }
                Err(err) => {
                    log::warn!("list: loading events failed: {err}");
                    lock(&self.model).error = Some("Couldn't load events".to_string());
                    return Err(err);
                }
            }
        } else {
            cached
        };

        let memberships = cx.store.read(|state| state.memberships.clone());
        let mut model = lock(&self.model);
        let filtered: Vec<_> = events
            .into_iter()
            .filter(|e| model.category.as_ref().is_none_or(|c| &e.category == c))
            .collect();
        model.rows = cards(&filtered, &memberships);
        model.empty = model.rows.is_empty();
        model.error = None;
        Ok(())
    }

    pub(crate) fn reflect(&self, kind: Membership, target_id: &str, active: bool, delta: i64) {
        for row in &mut lock(&self.model).rows {
            row.reflect(kind, target_id, active, delta);
        }
    }
}
