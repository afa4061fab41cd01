// ── Reactive entity collection ──
//
// Concurrent storage keyed by backend id with push-based change
// notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::EntityId;

/// A concurrent, reactive collection for a single entity type.
///
/// Every mutation rebuilds the snapshot that subscribers receive. The
/// snapshot is ordered by id so tables render in a stable order.
pub(crate) struct EntityCollection<T: Clone + Send + Sync + 'static> {
    by_id: DashMap<EntityId, Arc<T>>,
    snapshot: watch::Sender<Arc<Vec<Arc<T>>>>,
}

impl<T: Clone + Send + Sync + 'static> EntityCollection<T> {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Insert or update an entity. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, id: EntityId, entity: T) -> bool {
        let is_new = self.by_id.insert(id, Arc::new(entity)).is_none();
        self.rebuild_snapshot();
        is_new
    }

    /// Remove an entity. Returns it if it existed.
    pub(crate) fn remove(&self, id: EntityId) -> Option<Arc<T>> {
        let removed = self.by_id.remove(&id).map(|(_, v)| v);
        if removed.is_some() {
            self.rebuild_snapshot();
        }
        removed
    }

    pub(crate) fn get(&self, id: EntityId) -> Option<Arc<T>> {
        self.by_id.get(&id).map(|r| Arc::clone(r.value()))
    }

    /// Current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<T>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<T>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.rebuild_snapshot();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn ids(&self) -> Vec<EntityId> {
        self.by_id.iter().map(|r| *r.key()).collect()
    }

    fn rebuild_snapshot(&self) {
        let mut entries: Vec<(EntityId, Arc<T>)> = self
            .by_id
            .iter()
            .map(|r| (*r.key(), Arc::clone(r.value())))
            .collect();
        entries.sort_unstable_by_key(|(id, _)| *id);
        let values = entries.into_iter().map(|(_, v)| v).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn upsert_reports_new_ids() {
        let col: EntityCollection<String> = EntityCollection::new();
        assert!(col.upsert(1, "hello".into()));
        assert!(!col.upsert(1, "world".into()));
        assert_eq!(*col.get(1).unwrap(), "world");
    }

    #[test]
    fn snapshot_is_sorted_by_id() {
        let col: EntityCollection<&'static str> = EntityCollection::new();
        col.upsert(30, "c");
        col.upsert(10, "a");
        col.upsert(20, "b");

        let snap: Vec<_> = col.snapshot().iter().map(|s| **s).collect();
        assert_eq!(snap, vec!["a", "b", "c"]);
    }

    #[test]
    fn remove_and_clear() {
        let col: EntityCollection<u8> = EntityCollection::new();
        col.upsert(1, 1);
        col.upsert(2, 2);

        assert_eq!(*col.remove(1).unwrap(), 1);
        assert!(col.remove(1).is_none());
        assert_eq!(col.len(), 1);

        col.clear();
        assert_eq!(col.len(), 0);
        assert!(col.snapshot().is_empty());
    }

    #[test]
    fn subscribers_see_mutations() {
        let col: EntityCollection<u8> = EntityCollection::new();
        let mut rx = col.subscribe();
        col.upsert(7, 7);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);
    }
}
