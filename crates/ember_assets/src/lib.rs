//! Asset management for Ember.
//!
//! - [`SceneManager`]: template and keyframe caches, instancing, GPU release
//! - [`AssetCache`]: load-once cache shared by both
//! - [`SceneLoader`] / [`JsonSceneLoader`]: bytes to templates and keyframes
//! - [`CompileQueue`]: background GPU compilation of new instances

pub mod cache;
pub mod compile;
pub mod loader;
pub mod manager;
pub mod textures;

pub use cache::AssetCache;
pub use compile::{
    CompileBatch, CompileQueue, CompileReport, GpuBackend, HeadlessBackend, IncrementalCompiler,
};
pub use loader::{JsonSceneLoader, LoadContext, SceneLoader};
pub use manager::SceneManager;
pub use textures::TextureRegistry;
