//! Scene graph system
//!
//! - [`Node`]: scene node with hierarchy links and a transform
//! - [`Transform`]: TRS component with cached matrices
//! - [`Scene`]: node container, hierarchy editing and world matrix updates
//! - [`SceneTemplate`]: immutable, shareable node graph loaded from an asset
//! - instancing: [`Scene::instantiate`], [`Scene::attach_instance`]

pub mod instance;
pub mod node;
pub mod scene;
pub mod template;
pub mod transform;
pub mod transform_system;

pub use node::Node;
pub use scene::Scene;
pub use template::{
    ContextId, Drawable, Geometry, GpuAllocation, GpuObjects, SceneTemplate, TemplateNode,
};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
    pub struct TextureHandle;
}
