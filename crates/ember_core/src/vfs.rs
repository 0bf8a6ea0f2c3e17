//! Virtual filesystem
//!
//! Every asset byte the engine reads goes through a [`Vfs`]. A miss here is the
//! only source of [`EmberError::AssetNotFound`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::errors::{EmberError, Result};

/// Normalises an asset name so that different spellings hit the same cache entry.
///
/// Names are case-insensitive and both slash styles are accepted.
#[must_use]
pub fn normalize_path(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        match c {
            '\\' => out.push('/'),
            c => out.extend(c.to_lowercase()),
        }
    }
    while out.starts_with('/') {
        out.remove(0);
    }
    out
}

/// Read-only asset byte source.
pub trait Vfs: Send + Sync {
    /// Reads the whole asset. `name` is already normalised.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Whether `name` can be resolved.
    fn exists(&self, name: &str) -> bool;
}

/// In-memory filesystem, populated at runtime.
///
/// Useful for tests, tools and procedurally generated content.
#[derive(Default)]
pub struct MemoryVfs {
    files: RwLock<FxHashMap<String, Arc<[u8]>>>,
}

impl MemoryVfs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a file.
    pub fn insert(&self, name: &str, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.files
            .write()
            .insert(normalize_path(name), Arc::from(bytes));
    }

    /// Removes a file, returning whether it existed.
    pub fn remove(&self, name: &str) -> bool {
        self.files.write().remove(&normalize_path(name)).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl Vfs for MemoryVfs {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(&normalize_path(name))
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| EmberError::AssetNotFound(name.to_string()))
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(&normalize_path(name))
    }
}

/// Filesystem rooted at a data directory.
pub struct DirectoryVfs {
    root_path: PathBuf,
}

impl DirectoryVfs {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let root_path = if path.is_file() {
            path.parent().unwrap_or(Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };
        Self { root_path }
    }

    #[inline]
    #[must_use]
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    fn resolve(&self, name: &str) -> PathBuf {
        self.root_path.join(normalize_path(name))
    }
}

impl Vfs for DirectoryVfs {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.resolve(name);
        log::trace!("Reading '{name}' from {}", path.display());
        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(EmberError::AssetNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("Meshes\\Base_Anim.NIF"), "meshes/base_anim.nif");
        assert_eq!(normalize_path("/meshes/a.nif"), "meshes/a.nif");
    }

    #[test]
    fn test_memory_vfs_lookup_is_normalized() {
        let vfs = MemoryVfs::new();
        vfs.insert("Meshes\\Door.json", b"{}".to_vec());

        assert!(vfs.exists("meshes/door.json"));
        assert_eq!(vfs.read("MESHES/DOOR.JSON").unwrap(), b"{}");
    }

    #[test]
    fn test_memory_vfs_missing_is_not_found() {
        let vfs = MemoryVfs::new();
        let err = vfs.read("nothing.json").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_directory_vfs_missing_is_not_found() {
        let vfs = DirectoryVfs::new(std::env::temp_dir());
        let err = vfs.read("ember-definitely-missing-asset.json").unwrap_err();
        assert!(err.is_not_found());
    }
}
