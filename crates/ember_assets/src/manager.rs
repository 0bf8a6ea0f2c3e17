use std::sync::Arc;

use parking_lot::RwLock;

use ember_animation::{KeyframeProvider, KeyframeSet};
use ember_core::{EmberError, Result, Vfs, normalize_path};
use ember_scene::{ContextId, NodeHandle, Scene, SceneTemplate};

use crate::cache::AssetCache;
use crate::compile::{CompileBatch, IncrementalCompiler};
use crate::loader::{JsonSceneLoader, LoadContext, SceneLoader};
use crate::textures::TextureRegistry;

/// Loads, caches and instantiates scene templates.
///
/// Templates and keyframe sets are cached by normalised name and shared as
/// `Arc`s. The manager is `Send + Sync`; templates can be requested and
/// instantiated from any thread.
pub struct SceneManager {
    vfs: Arc<dyn Vfs>,
    loader: Box<dyn SceneLoader>,
    textures: TextureRegistry,
    templates: AssetCache<SceneTemplate>,
    keyframes: AssetCache<KeyframeSet>,
    compiler: RwLock<Option<Arc<dyn IncrementalCompiler>>>,
}

impl SceneManager {
    /// Manager reading the JSON scene format.
    #[must_use]
    pub fn new(vfs: Arc<dyn Vfs>) -> Self {
        Self::with_loader(vfs, Box::new(JsonSceneLoader))
    }

    #[must_use]
    pub fn with_loader(vfs: Arc<dyn Vfs>, loader: Box<dyn SceneLoader>) -> Self {
        Self {
            vfs,
            loader,
            textures: TextureRegistry::new(),
            templates: AssetCache::new(),
            keyframes: AssetCache::new(),
            compiler: RwLock::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn vfs(&self) -> &Arc<dyn Vfs> {
        &self.vfs
    }

    #[inline]
    #[must_use]
    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    /// Routes the geometry of every new instance to `compiler`. `None` disables it.
    pub fn set_incremental_compiler(&self, compiler: Option<Arc<dyn IncrementalCompiler>>) {
        *self.compiler.write() = compiler;
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        if !self.vfs.exists(name) {
            return Err(EmberError::AssetNotFound(name.to_string()));
        }
        self.vfs.read(name)
    }

    // ========================================================================
    // Cache
    // ========================================================================

    /// Shared template for `name`, loaded on first request.
    pub fn get_template(&self, name: &str) -> Result<Arc<SceneTemplate>> {
        let key = normalize_path(name);
        self.templates.get_or_load(&key, || {
            log::debug!("Loading scene template '{key}'");
            let bytes = self.read(&key)?;
            let ctx = LoadContext {
                name: &key,
                textures: &self.textures,
            };
            self.loader.load_template(&ctx, &bytes)
        })
    }

    /// Shared keyframes for `name`, loaded on first request.
    pub fn get_keyframes(&self, name: &str) -> Result<Arc<KeyframeSet>> {
        let key = normalize_path(name);
        self.keyframes.get_or_load(&key, || {
            log::debug!("Loading keyframes '{key}'");
            let bytes = self.read(&key)?;
            let ctx = LoadContext {
                name: &key,
                textures: &self.textures,
            };
            self.loader.load_keyframes(&ctx, &bytes)
        })
    }

    #[must_use]
    pub fn is_cached(&self, name: &str) -> bool {
        self.templates.contains(&normalize_path(name))
    }

    #[must_use]
    pub fn cached_template_count(&self) -> usize {
        self.templates.len()
    }

    /// Drops the cached template and keyframes of `name`.
    ///
    /// Live instances are untouched; the next request reloads from the VFS.
    pub fn evict(&self, name: &str) -> bool {
        let key = normalize_path(name);
        let template = self.templates.evict(&key);
        let keyframes = self.keyframes.evict(&key);
        template || keyframes
    }

    pub fn clear(&self) {
        self.templates.clear();
        self.keyframes.clear();
    }

    /// Releases GPU objects of every cached template in `context`.
    ///
    /// CPU-side data stays valid for further instancing. Returns the number of
    /// released objects.
    pub fn release_gl_objects(&self, context: ContextId) -> usize {
        let released: usize = self
            .templates
            .values()
            .iter()
            .map(|t| t.release_gpu_objects(context))
            .sum();
        log::debug!("Released {released} GPU objects of context {}", context.0);
        released
    }

    // ========================================================================
    // Instancing
    // ========================================================================

    /// New root-level instance of `name` in `scene`.
    pub fn create_instance(&self, name: &str, scene: &mut Scene) -> Result<NodeHandle> {
        let template = self.get_template(name)?;
        let instance = scene.instantiate(&template);
        self.notify_compiler(&template);
        Ok(instance)
    }

    /// New instance of `name` attached under `parent`.
    ///
    /// `parent` must already be at its final pose, see [`attach_to`](Self::attach_to).
    pub fn create_instance_attached(
        &self,
        name: &str,
        scene: &mut Scene,
        parent: NodeHandle,
    ) -> Result<NodeHandle> {
        if scene.get_node(parent).is_none() {
            return Err(EmberError::InvalidNode);
        }
        let instance = self.create_instance(name, scene)?;
        if let Err(err) = self.attach_to(scene, instance, parent) {
            scene.remove_node(instance);
            return Err(err);
        }
        Ok(instance)
    }

    /// Attaches `instance` under `parent`.
    ///
    /// World-space nodes of the instance are baked against the parent's pose
    /// right now and will not follow later parent moves.
    pub fn attach_to(&self, scene: &mut Scene, instance: NodeHandle, parent: NodeHandle) -> Result<()> {
        scene.attach_instance(instance, parent)
    }

    fn notify_compiler(&self, template: &SceneTemplate) {
        let Some(compiler) = self.compiler.read().clone() else {
            return;
        };
        let geometries: Vec<_> = template.geometries().cloned().collect();
        if geometries.is_empty() {
            return;
        }
        let batch = CompileBatch {
            label: template.name().to_string(),
            geometries,
        };
        if let Err(err) = compiler.enqueue(batch) {
            log::warn!("Could not queue '{}' for compilation: {err}", template.name());
        }
    }
}

impl KeyframeProvider for SceneManager {
    fn keyframes(&self, name: &str) -> Result<Arc<KeyframeSet>> {
        self.get_keyframes(name)
    }
}
