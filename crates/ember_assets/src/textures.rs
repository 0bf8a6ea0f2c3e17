use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use ember_core::normalize_path;
use ember_scene::TextureHandle;

#[derive(Default)]
struct RegistryInner {
    names: SlotMap<TextureHandle, String>,
    lookup: FxHashMap<String, TextureHandle>,
}

/// Hands out one opaque [`TextureHandle`] per texture name.
///
/// Pixel data is not this crate's concern; templates only carry the handle.
#[derive(Default)]
pub struct TextureRegistry {
    inner: RwLock<RegistryInner>,
}

impl TextureRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// [Write] Handle for `name`, registering it on first use.
    pub fn acquire(&self, name: &str) -> TextureHandle {
        let key = normalize_path(name);
        if let Some(&handle) = self.inner.read().lookup.get(&key) {
            return handle;
        }

        let mut guard = self.inner.write();
        if let Some(&handle) = guard.lookup.get(&key) {
            return handle;
        }
        let handle = guard.names.insert(key.clone());
        guard.lookup.insert(key, handle);
        handle
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.inner.read().lookup.get(&normalize_path(name)).copied()
    }

    #[must_use]
    pub fn name(&self, handle: TextureHandle) -> Option<String> {
        self.inner.read().names.get(handle).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
