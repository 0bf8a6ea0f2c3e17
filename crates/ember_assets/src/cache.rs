use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::sync::Arc;

use ember_core::Result;

// One slot per key. Empty until its first successful load.
type Slot<T> = Arc<Mutex<Option<Arc<T>>>>;

/// Thread-safe load-once cache keyed by asset name.
///
/// The index lock is only held to find or create a key's slot. Loading happens
/// under the slot's own mutex, so concurrent misses on one key load it once
/// while other keys keep loading in parallel. Failed loads leave nothing
/// behind, so a later request retries.
pub struct AssetCache<T> {
    slots: RwLock<FxHashMap<String, Slot<T>>>,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> AssetCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: RwLock::default(),
        }
    }

    /// [Read] Cached value without triggering a load.
    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        let slot = self.slots.read().get(key).cloned()?;
        let guard = slot.lock();
        guard.clone()
    }

    /// [Read/Write] Cached value, or the result of `load` stored under `key`.
    pub fn get_or_load(&self, key: &str, load: impl FnOnce() -> Result<T>) -> Result<Arc<T>> {
        loop {
            let slot = self.slot(key);
            let mut guard = slot.lock();
            if let Some(value) = guard.as_ref() {
                log::trace!("Cache hit: {key}");
                return Ok(Arc::clone(value));
            }

            // The slot may have been discarded or evicted while we waited on it.
            let current = self
                .slots
                .read()
                .get(key)
                .is_some_and(|s| Arc::ptr_eq(s, &slot));
            if !current {
                continue;
            }

            return match load() {
                Ok(value) => {
                    let value = Arc::new(value);
                    *guard = Some(Arc::clone(&value));
                    Ok(value)
                }
                Err(err) => {
                    drop(guard);
                    self.discard_empty(key, &slot);
                    Err(err)
                }
            };
        }
    }

    fn slot(&self, key: &str) -> Slot<T> {
        let existing = self.slots.read().get(key).cloned();
        match existing {
            Some(slot) => slot,
            None => Arc::clone(self.slots.write().entry(key.to_string()).or_default()),
        }
    }

    /// Drops a slot whose load failed unless another caller is waiting to retry it.
    fn discard_empty(&self, key: &str, slot: &Slot<T>) {
        let mut slots = self.slots.write();
        // index + `slot`: nobody else holds it, so it is still empty
        let unused = slots
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && Arc::strong_count(current) == 2);
        if unused {
            slots.remove(key);
        }
    }

    /// [Write] Forgets `key`. Values already handed out stay alive.
    pub fn evict(&self, key: &str) -> bool {
        let removed = self.slots.write().remove(key);
        removed.is_some_and(|slot| slot.lock().is_some())
    }

    pub fn clear(&self) {
        self.slots.write().clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.snapshot().iter().filter(|s| s.lock().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every loaded value.
    pub fn values(&self) -> Vec<Arc<T>> {
        self.snapshot().iter().filter_map(|s| s.lock().clone()).collect()
    }

    // Slot locks are never taken while the index lock is held.
    fn snapshot(&self) -> Vec<Slot<T>> {
        self.slots.read().values().cloned().collect()
    }
}
