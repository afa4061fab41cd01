// ── Full refresh application ──
//
// Replaces store contents with a freshly fetched listing.

use std::collections::HashSet;

use chrono::Utc;

use super::DataStore;
use super::collection::EntityCollection;
use crate::model::{Branch, EntityId, Restaurant};

/// Upsert all incoming entities, then prune ids missing from the listing.
/// Avoids the brief empty state a clear-then-insert would publish.
fn upsert_and_prune<T: Clone + Send + Sync + 'static>(
    collection: &EntityCollection<T>,
    items: Vec<(EntityId, T)>,
) {
    let incoming: HashSet<EntityId> = items.iter().map(|(id, _)| *id).collect();
    for (id, entity) in items {
        collection.upsert(id, entity);
    }
    for existing in collection.ids() {
        if !incoming.contains(&existing) {
            collection.remove(existing);
        }
    }
}

impl DataStore {
    pub(crate) fn apply_restaurants(&self, restaurants: Vec<Restaurant>) {
        upsert_and_prune(
            &self.restaurants,
            restaurants.into_iter().map(|r| (r.id, r)).collect(),
        );
    }

    pub(crate) fn apply_branches(&self, branches: Vec<Branch>) {
        upsert_and_prune(
            &self.branches,
            branches.into_iter().map(|b| (b.id, b)).collect(),
        );
    }

    /// Apply a complete listing of both collections and stamp the time.
    pub(crate) fn apply_refresh(&self, restaurants: Vec<Restaurant>, branches: Vec<Branch>) {
        self.apply_restaurants(restaurants);
        self.apply_branches(branches);
        self.last_refresh.send_modify(|t| *t = Some(Utc::now()));
    }
}
