// ── Central reactive data store ──
//
// Holds the most recent restaurant and branch listings. Mutations are
// broadcast to subscribers via `watch` channels.

mod collection;
mod refresh;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use self::collection::EntityCollection;
use crate::model::{Branch, EntityId, Overview, Restaurant};
use crate::stream::EntityStream;

/// Reactive store for everything the dashboard displays.
pub struct DataStore {
    pub(crate) restaurants: EntityCollection<Restaurant>,
    pub(crate) branches: EntityCollection<Branch>,
    pub(crate) last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DataStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            restaurants: EntityCollection::new(),
            branches: EntityCollection::new(),
            last_refresh,
        }
    }

    // ── Snapshots ────────────────────────────────────────────────────

    pub fn restaurants_snapshot(&self) -> Arc<Vec<Arc<Restaurant>>> {
        self.restaurants.snapshot()
    }

    pub fn branches_snapshot(&self) -> Arc<Vec<Arc<Branch>>> {
        self.branches.snapshot()
    }

    pub fn restaurant(&self, id: EntityId) -> Option<Arc<Restaurant>> {
        self.restaurants.get(id)
    }

    pub fn branch(&self, id: EntityId) -> Option<Arc<Branch>> {
        self.branches.get(id)
    }

    /// Branches belonging to one restaurant, in id order.
    pub fn branches_of(&self, restaurant: EntityId) -> Vec<Arc<Branch>> {
        self.branches
            .snapshot()
            .iter()
            .filter(|b| b.restaurant_id == restaurant)
            .cloned()
            .collect()
    }

    pub fn overview(&self) -> Overview {
        let branches = self.branches.snapshot();
        Overview::compute(self.restaurants.len(), branches.iter().map(AsRef::as_ref))
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    // ── Subscriptions ────────────────────────────────────────────────

    pub fn subscribe_restaurants(&self) -> EntityStream<Restaurant> {
        EntityStream::new(self.restaurants.subscribe())
    }

    pub fn subscribe_branches(&self) -> EntityStream<Branch> {
        EntityStream::new(self.branches.subscribe())
    }

    pub fn subscribe_last_refresh(&self) -> watch::Receiver<Option<DateTime<Utc>>> {
        self.last_refresh.subscribe()
    }

    /// Forget everything, e.g. after the session is dropped.
    pub(crate) fn clear(&self) {
        self.restaurants.clear();
        self.branches.clear();
        self.last_refresh.send_modify(|t| *t = None);
    }
}
