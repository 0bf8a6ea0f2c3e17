//! Scene loaders
//!
//! Turning asset bytes into a [`SceneTemplate`] or a [`KeyframeSet`] is the job
//! of a [`SceneLoader`]. The built-in [`JsonSceneLoader`] reads a small JSON
//! description:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "Root", "children": [1] },
//!     { "name": "Bip01", "translation": [0, 0, 1],
//!       "rotation": [0, 0, 0, 1], "scale": [1, 1, 1],
//!       "mesh": { "positions": [[0,0,0],[1,0,0],[0,1,0]], "indices": [0,1,2],
//!                 "texture": "textures/body.dds" },
//!       "world_space": false }
//!   ],
//!   "text_keys": [[0.0, "idle: start"], [2.0, "idle: stop"]],
//!   "controllers": [
//!     { "target": "Bip01", "path": "translation", "interpolation": "linear",
//!       "times": [0.0, 2.0], "values": [[0,0,0], [0,0,1]] }
//!   ]
//! }
//! ```
//!
//! Node 0 is the root. Rotations are `[x, y, z, w]`.

use std::sync::Arc;

use ember_animation::{InterpolationMode, KeyframeSet, KeyframeTrack, NodeController, TargetPath, TextKeyMap};
use ember_core::{EmberError, Result};
use ember_scene::{Drawable, Geometry, SceneTemplate, TemplateNode, Transform};
use glam::{Quat, Vec3};
use serde::Deserialize;

use crate::textures::TextureRegistry;

/// What a loader may use besides the raw bytes.
pub struct LoadContext<'a> {
    /// Normalised asset name.
    pub name: &'a str,
    pub textures: &'a TextureRegistry,
}

pub trait SceneLoader: Send + Sync {
    fn load_template(&self, ctx: &LoadContext<'_>, bytes: &[u8]) -> Result<SceneTemplate>;

    fn load_keyframes(&self, ctx: &LoadContext<'_>, bytes: &[u8]) -> Result<KeyframeSet>;
}

#[derive(Debug, Default, Deserialize)]
struct SceneDoc {
    #[serde(default)]
    nodes: Vec<NodeDoc>,
    #[serde(default)]
    text_keys: Vec<(f32, String)>,
    #[serde(default)]
    controllers: Vec<ControllerDoc>,
}

fn identity_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn unit_scale() -> [f32; 3] {
    [1.0; 3]
}

#[derive(Debug, Deserialize)]
struct NodeDoc {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default = "identity_rotation")]
    rotation: [f32; 4],
    #[serde(default = "unit_scale")]
    scale: [f32; 3],
    #[serde(default)]
    children: Vec<usize>,
    #[serde(default)]
    mesh: Option<MeshDoc>,
    #[serde(default)]
    world_space: bool,
}

#[derive(Debug, Deserialize)]
struct MeshDoc {
    positions: Vec<[f32; 3]>,
    #[serde(default)]
    indices: Vec<u32>,
    #[serde(default)]
    texture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ControllerDoc {
    target: String,
    path: TargetPath,
    #[serde(default)]
    interpolation: InterpolationMode,
    times: Vec<f32>,
    values: Vec<Vec<f32>>,
}

/// Loader for the JSON scene format described in the module docs.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSceneLoader;

impl JsonSceneLoader {
    fn parse(ctx: &LoadContext<'_>, bytes: &[u8]) -> Result<SceneDoc> {
        serde_json::from_slice(bytes).map_err(|e| EmberError::format(ctx.name, e.to_string()))
    }

    fn build_node(ctx: &LoadContext<'_>, index: usize, doc: NodeDoc) -> Result<TemplateNode> {
        let rotation = Quat::from_array(doc.rotation);
        if !rotation.is_finite() || rotation.length_squared() < f32::EPSILON {
            return Err(EmberError::format(ctx.name, format!("node {index} has an invalid rotation")));
        }

        let drawable = match doc.mesh {
            Some(mesh) => {
                let vertex_count = mesh.positions.len();
                if let Some(&bad) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
                    return Err(EmberError::format(
                        ctx.name,
                        format!("node {index} indexes vertex {bad} of {vertex_count}"),
                    ));
                }
                let geometry = Geometry::new(
                    format!("{}#{index}", ctx.name),
                    mesh.positions.into_iter().map(Vec3::from_array).collect(),
                    mesh.indices,
                );
                Some(Drawable {
                    geometry: Arc::new(geometry),
                    texture: mesh.texture.as_deref().map(|t| ctx.textures.acquire(t)),
                })
            }
            None => None,
        };

        Ok(TemplateNode {
            name: doc.name,
            transform: Transform::from_trs(
                Vec3::from_array(doc.translation),
                rotation.normalize(),
                Vec3::from_array(doc.scale),
            ),
            children: doc.children,
            drawable,
            world_space: doc.world_space,
        })
    }

    fn build_controller(ctx: &LoadContext<'_>, doc: ControllerDoc) -> Result<NodeController> {
        let width = match doc.path {
            TargetPath::Rotation => 4,
            TargetPath::Translation | TargetPath::Scale => 3,
        };
        if let Some(bad) = doc.values.iter().find(|v| v.len() != width) {
            return Err(EmberError::format(
                ctx.name,
                format!(
                    "controller '{}' expects {width} components per value, found {}",
                    doc.target,
                    bad.len()
                ),
            ));
        }

        let controller = match doc.path {
            TargetPath::Rotation => {
                let values = doc
                    .values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        let q = Quat::from_xyzw(v[0], v[1], v[2], v[3]);
                        if !q.is_finite() || q.length_squared() < f32::EPSILON {
                            return Err(EmberError::format(
                                ctx.name,
                                format!("controller '{}' has an invalid rotation at key {i}", doc.target),
                            ));
                        }
                        Ok(q.normalize())
                    })
                    .collect::<Result<Vec<_>>>()?;
                NodeController::rotation(doc.target, KeyframeTrack::new(doc.times, values, doc.interpolation))
            }
            TargetPath::Translation | TargetPath::Scale => {
                let values: Vec<Vec3> = doc.values.iter().map(|v| Vec3::new(v[0], v[1], v[2])).collect();
                let track = KeyframeTrack::new(doc.times, values, doc.interpolation);
                if doc.path == TargetPath::Scale {
                    NodeController::scale(doc.target, track)
                } else {
                    NodeController::translation(doc.target, track)
                }
            }
        };

        if !controller.is_valid() {
            return Err(EmberError::format(
                ctx.name,
                format!("controller '{}' has mismatched times and values", controller.target()),
            ));
        }
        Ok(controller)
    }
}

impl SceneLoader for JsonSceneLoader {
    fn load_template(&self, ctx: &LoadContext<'_>, bytes: &[u8]) -> Result<SceneTemplate> {
        let doc = Self::parse(ctx, bytes)?;
        let nodes = doc
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| Self::build_node(ctx, index, node))
            .collect::<Result<Vec<_>>>()?;
        SceneTemplate::new(ctx.name, nodes)
    }

    fn load_keyframes(&self, ctx: &LoadContext<'_>, bytes: &[u8]) -> Result<KeyframeSet> {
        let doc = Self::parse(ctx, bytes)?;
        let controllers = doc
            .controllers
            .into_iter()
            .map(|c| Self::build_controller(ctx, c))
            .collect::<Result<Vec<_>>>()?;
        Ok(KeyframeSet::new(ctx.name, TextKeyMap::from_keys(doc.text_keys), controllers))
    }
}
