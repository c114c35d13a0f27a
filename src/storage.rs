//! Service registry storage
//!
//! Uses DashMap for lock-free concurrent access. Every identifier remembers
//! the position it was first registered at, so tag and interface views come
//! back in registration order regardless of map iteration order.

use crate::Service;
use ahash::RandomState;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A registered service with its registration position
struct Slot {
    position: u64,
    service: Arc<Service>,
}

/// Thread-safe storage for service descriptors
///
/// Uses `DashMap` with `ahash` for maximum concurrent performance.
pub(crate) struct ServiceStorage {
    /// Map from identifier to descriptor
    services: DashMap<String, Slot, RandomState>,
    /// Next registration position
    next_position: AtomicU64,
}

impl ServiceStorage {
    /// Create new empty storage with optimized shard count.
    ///
    /// Uses 8 shards as a balance between creation overhead and concurrent
    /// read performance; typical containers hold a few dozen services.
    #[inline]
    pub(crate) fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated capacity and optimized shards.
    #[inline]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        // Scale shards based on expected capacity
        let shard_amount = if capacity <= 16 {
            8
        } else if capacity <= 64 {
            16
        } else {
            32
        };
        Self {
            services: DashMap::with_capacity_and_hasher_and_shard_amount(
                capacity,
                RandomState::new(),
                shard_amount,
            ),
            next_position: AtomicU64::new(0),
        }
    }

    #[inline]
    fn next_position(&self) -> u64 {
        self.next_position.fetch_add(1, Ordering::Relaxed)
    }

    /// Insert or replace. A replaced identifier keeps its original position.
    pub(crate) fn insert(&self, id: String, service: Arc<Service>) {
        match self.services.entry(id) {
            Entry::Occupied(mut slot) => slot.get_mut().service = service,
            Entry::Vacant(slot) => {
                let position = self.next_position();
                slot.insert(Slot { position, service });
            }
        }
    }

    /// Insert unless the identifier is taken. Returns the service now stored
    /// under `id` and whether it is the one passed in.
    pub(crate) fn insert_if_absent(&self, id: String, service: Arc<Service>) -> (Arc<Service>, bool) {
        match self.services.entry(id) {
            Entry::Occupied(slot) => (Arc::clone(&slot.get().service), false),
            Entry::Vacant(slot) => {
                let position = self.next_position();
                slot.insert(Slot {
                    position,
                    service: Arc::clone(&service),
                });
                (service, true)
            }
        }
    }

    /// Check if an identifier is registered
    #[inline]
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.services.contains_key(id)
    }

    /// Descriptor registered under `id`
    #[inline]
    pub(crate) fn get(&self, id: &str) -> Option<Arc<Service>> {
        self.services.get(id).map(|slot| Arc::clone(&slot.service))
    }

    /// Remove `id` only if it still holds exactly `service`
    #[inline]
    pub(crate) fn remove_if_same(&self, id: &str, service: &Arc<Service>) -> bool {
        self.services
            .remove_if(id, |_, slot| Arc::ptr_eq(&slot.service, service))
            .is_some()
    }

    /// Descriptors matching `predicate`, in registration order.
    ///
    /// Map guards are released before the result is returned, so callers may
    /// resolve the services (and register new ones) freely.
    pub(crate) fn filter<F>(&self, predicate: F) -> Vec<Arc<Service>>
    where
        F: Fn(&Service) -> bool,
    {
        let mut matches: Vec<(u64, Arc<Service>)> = self
            .services
            .iter()
            .filter(|slot| predicate(slot.service.as_ref()))
            .map(|slot| (slot.position, Arc::clone(&slot.service)))
            .collect();
        matches.sort_unstable_by_key(|(position, _)| *position);
        matches.into_iter().map(|(_, service)| service).collect()
    }

    /// All identifiers, in registration order
    pub(crate) fn ids(&self) -> Vec<String> {
        let mut ids: Vec<(u64, String)> = self
            .services
            .iter()
            .map(|slot| (slot.position, slot.key().clone()))
            .collect();
        ids.sort_unstable_by_key(|(position, _)| *position);
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Keep only identifiers for which `keep` returns true
    #[inline]
    pub(crate) fn retain<F>(&self, keep: F)
    where
        F: Fn(&str) -> bool,
    {
        self.services.retain(|id, _| keep(id.as_str()));
    }

    /// Get number of registered services
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if empty
    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl Default for ServiceStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ServiceStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceStorage")
            .field("count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(class: &str, tags: &[&str]) -> Arc<Service> {
        Arc::new(Service::new(class).with_tags(tags.iter().copied()))
    }

    #[test]
    fn test_storage_insert_and_get() {
        let storage = ServiceStorage::new();
        storage.insert("app::A".into(), service("app::A", &[]));

        assert!(storage.contains("app::A"));
        assert_eq!(storage.get("app::A").unwrap().class(), "app::A");
        assert!(storage.get("app::B").is_none());
    }

    #[test]
    fn test_replace_keeps_position() {
        let storage = ServiceStorage::new();
        storage.insert("app::A".into(), service("app::A", &[]));
        storage.insert("app::B".into(), service("app::B", &[]));
        storage.insert("app::A".into(), service("app::A2", &[]));

        assert_eq!(storage.ids(), vec!["app::A".to_string(), "app::B".to_string()]);
        assert_eq!(storage.get("app::A").unwrap().class(), "app::A2");
        assert_eq!(storage.len(), 2);
    }

    #[test]
    fn test_insert_if_absent() {
        let storage = ServiceStorage::new();
        let first = service("app::A", &[]);
        let (stored, inserted) = storage.insert_if_absent("app::A".into(), Arc::clone(&first));
        assert!(inserted);
        assert!(Arc::ptr_eq(&stored, &first));

        let (stored, inserted) = storage.insert_if_absent("app::A".into(), service("app::A", &[]));
        assert!(!inserted);
        assert!(Arc::ptr_eq(&stored, &first));
    }

    #[test]
    fn test_remove_if_same() {
        let storage = ServiceStorage::new();
        let original = service("app::A", &[]);
        storage.insert("app::A".into(), Arc::clone(&original));

        assert!(!storage.remove_if_same("app::A", &service("app::A", &[])));
        assert!(storage.contains("app::A"));

        assert!(storage.remove_if_same("app::A", &original));
        assert!(!storage.contains("app::A"));
    }

    #[test]
    fn test_filter_in_registration_order() {
        let storage = ServiceStorage::new();
        for i in 0..20 {
            let tags: &[&str] = if i % 2 == 0 { &["even"] } else { &[] };
            storage.insert(format!("app::S{i}"), service(&format!("app::S{i}"), tags));
        }

        let classes: Vec<String> = storage
            .filter(|s| s.has_tag("even"))
            .iter()
            .map(|s| s.class().to_owned())
            .collect();
        let expected: Vec<String> = (0..20).step_by(2).map(|i| format!("app::S{i}")).collect();
        assert_eq!(classes, expected);
    }

    #[test]
    fn test_retain() {
        let storage = ServiceStorage::new();
        storage.insert("keep".into(), service("keep", &[]));
        storage.insert("drop".into(), service("drop", &[]));

        storage.retain(|id| id == "keep");
        assert_eq!(storage.ids(), vec!["keep".to_string()]);
        assert!(!storage.is_empty());
    }
}
