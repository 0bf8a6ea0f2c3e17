#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

//! Ember: scene template caching, instancing and marker-driven animation.
//!
//! This crate re-exports the workspace crates:
//!
//! - [`core`]: errors, virtual filesystem, string interner
//! - [`scene`]: scene graph, templates and instancing
//! - [`animation`]: keyframe sources and the playback component
//! - [`assets`]: the scene manager, loaders and GPU compile queue

pub use ember_animation as animation;
pub use ember_assets as assets;
pub use ember_core as core;
pub use ember_scene as scene;

pub use ember_animation::{AnimInfo, Animation, AnimationSettings, KeyframeSet, MarkerConvention, TextKeyListener};
pub use ember_assets::{CompileQueue, SceneManager};
pub use ember_core::{EmberError, Result, interner};
pub use ember_scene::{NodeHandle, Scene, SceneTemplate};

pub mod prelude {
    pub use ember_animation::{
        AnimInfo, Animation, AnimationSettings, IgnoreKeys, KeyframeProvider, KeyframeSet, MarkerConvention,
        NodeController, TextKeyListener, TextKeyMap,
    };
    pub use ember_assets::{
        CompileQueue, GpuBackend, HeadlessBackend, IncrementalCompiler, JsonSceneLoader, SceneLoader,
        SceneManager,
    };
    pub use ember_core::{DirectoryVfs, EmberError, MemoryVfs, Result, Vfs};
    pub use ember_scene::{ContextId, Node, NodeHandle, Scene, SceneTemplate, Transform};
}
