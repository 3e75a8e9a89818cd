use std::sync::Mutex;

use crate::errors::AppResult;
use crate::gateway::Gateway;
use crate::models::{Category, Event, EventFilters};

use super::{ViewContext, lock};

pub const TRENDING_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendingItem {
    /// 1-based.
    pub rank: usize,
    pub event_id: String,
    pub title: String,
    pub emoji: &'static str,
    pub attending_count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTile {
    pub category: Category,
    pub emoji: &'static str,
    pub accent: &'static str,
    pub event_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExploreModel {
    pub trending: Vec<TrendingItem>,
    pub categories: Vec<CategoryTile>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExploreView {
    model: Mutex<ExploreModel>,
}

impl ExploreView {
    pub fn model(&self) -> ExploreModel {
        lock(&self.model).clone()
    }

    pub async fn init<G: Gateway>(&self, cx: ViewContext<'_, G>) -> AppResult<()> {
        let cached = cx.store.read(|state| state.events.clone());
        let events = if cached.is_empty() {
            match cx.gateway.get_events(&EventFilters::limit(cx.config.app.list_limit)).await {
                Ok(events) => {
                    cx.store.update(|state| state.replace_events(events.clone()));
                    events
                }
                Err(err) => {
                    log::warn!("explore: loading events failed: {err}");
                    lock(&self.model).error = Some("Couldn't load events".to_string());
                    return Err(err);
                }
            }
        } else {
            cached
        };

        let mut model = lock(&self.model);
        model.trending = trending(&events);
        model.categories = category_tiles(&events);
        model.error = None;
        Ok(())
    }
}

fn trending(events: &[Event]) -> Vec<TrendingItem> {
    events
        .iter()
        .take(TRENDING_LIMIT)
        .enumerate()
        .map(|(i, e)| TrendingItem {
            rank: i + 1,
            event_id: e.id.clone(),
            title: e.title.clone(),
            emoji: e.category.meta().emoji,
            attending_count: e.attending_count,
        })
        .collect()
}

fn category_tiles(events: &[Event]) -> Vec<CategoryTile> {
    Category::KNOWN
        .iter()
        .map(|category| {
            let meta = category.meta();
            CategoryTile {
                category: category.clone(),
                emoji: meta.emoji,
                accent: meta.accent,
                event_count: events.iter().filter(|e| &e.category == category).count(),
            }
        })
        .collect()
}
