use std::collections::HashSet;

use baglease_core::{ActorId, ResourceKey};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Admins currently holding a read-only view, per key.
///
/// Only used to decide whom to notify; it grants nothing by itself.
/// Empty sets are never left behind.
#[derive(Debug, Default)]
pub struct ViewerRegistry {
    sessions: DashMap<ResourceKey, HashSet<ActorId>>,
}

impl ViewerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: ResourceKey, viewer: ActorId) {
        self.sessions.entry(key).or_default().insert(viewer);
    }

    /// Returns true if `viewer` was registered for `key`.
    pub fn unregister(&self, key: &ResourceKey, viewer: ActorId) -> bool {
        match self.sessions.entry(*key) {
            Entry::Occupied(mut slot) => {
                let removed = slot.get_mut().remove(&viewer);
                if slot.get().is_empty() {
                    slot.remove();
                }
                removed
            }
            Entry::Vacant(_) => false,
        }
    }

    /// Drops `viewer` from every key. Returns how many keys it was on.
    pub fn unregister_everywhere(&self, viewer: ActorId) -> usize {
        let mut removed = 0;
        self.sessions.retain(|_, viewers| {
            if viewers.remove(&viewer) {
                removed += 1;
            }
            !viewers.is_empty()
        });
        removed
    }

    /// Viewers of `key` in ascending id order.
    pub fn snapshot(&self, key: &ResourceKey) -> Vec<ActorId> {
        let mut viewers: Vec<ActorId> = self
            .sessions
            .get(key)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        viewers.sort_unstable();
        viewers
    }

    pub fn contains(&self, key: &ResourceKey, viewer: ActorId) -> bool {
        self.sessions
            .get(key)
            .is_some_and(|set| set.contains(&viewer))
    }

    /// Number of keys with at least one viewer.
    pub fn key_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn clear(&self) {
        self.sessions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(page: u32) -> ResourceKey {
        ResourceKey::new(ActorId(1), page).unwrap()
    }

    #[test]
    fn test_unregister_prunes_empty_sets() {
        let registry = ViewerRegistry::new();
        registry.register(key(1), ActorId(10));
        registry.register(key(1), ActorId(11));

        assert!(registry.unregister(&key(1), ActorId(10)));
        assert_eq!(registry.key_count(), 1);
        assert!(registry.unregister(&key(1), ActorId(11)));
        assert_eq!(registry.key_count(), 0);
        assert!(!registry.unregister(&key(1), ActorId(11)));
    }

    #[test]
    fn test_unregister_everywhere() {
        let registry = ViewerRegistry::new();
        registry.register(key(1), ActorId(10));
        registry.register(key(2), ActorId(10));
        registry.register(key(2), ActorId(11));

        assert_eq!(registry.unregister_everywhere(ActorId(10)), 2);
        assert_eq!(registry.snapshot(&key(2)), vec![ActorId(11)]);
        assert!(registry.snapshot(&key(1)).is_empty());
        assert_eq!(registry.key_count(), 1);
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = ViewerRegistry::new();
        for id in [30, 10, 20] {
            registry.register(key(1), ActorId(id));
        }
        assert_eq!(
            registry.snapshot(&key(1)),
            vec![ActorId(10), ActorId(20), ActorId(30)]
        );
        assert!(registry.contains(&key(1), ActorId(20)));
    }
}
