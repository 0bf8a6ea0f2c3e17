//! Scene templates
//!
//! A [`SceneTemplate`] is the immutable, shareable result of loading one asset:
//! a flattened node hierarchy plus drawable geometry. Templates are handed out
//! as `Arc<SceneTemplate>` and are never mutated after load. Live copies are
//! made with [`Scene::instantiate`](crate::Scene::instantiate).
//!
//! GPU objects built from a template's geometry are tracked per rendering
//! context in [`GpuObjects`], so one context can be torn down without touching
//! the CPU-side data or any other context.

use std::sync::Arc;

use ember_core::{EmberError, Result};
use glam::Vec3;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::TextureHandle;
use crate::transform::Transform;

/// Identity of a rendering context (one per window / GL context / device).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextId(pub u32);

/// Backend object created for one geometry in one context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuAllocation {
    pub id: u64,
    pub size_bytes: usize,
}

/// Per-context GPU objects of a single geometry.
#[derive(Debug, Default)]
pub struct GpuObjects {
    slots: Mutex<FxHashMap<ContextId, GpuAllocation>>,
}

impl GpuObjects {
    #[must_use]
    pub fn is_compiled(&self, context: ContextId) -> bool {
        self.slots.lock().contains_key(&context)
    }

    /// Records a compiled object, replacing any previous one for `context`.
    pub fn insert(&self, context: ContextId, allocation: GpuAllocation) -> Option<GpuAllocation> {
        self.slots.lock().insert(context, allocation)
    }

    pub fn release(&self, context: ContextId) -> Option<GpuAllocation> {
        self.slots.lock().remove(&context)
    }

    #[must_use]
    pub fn contexts(&self) -> Vec<ContextId> {
        let mut contexts: Vec<_> = self.slots.lock().keys().copied().collect();
        contexts.sort_unstable();
        contexts
    }
}

/// Immutable CPU-side mesh data.
#[derive(Debug)]
pub struct Geometry {
    pub label: String,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
    gpu: GpuObjects,
}

impl Geometry {
    #[must_use]
    pub fn new(label: impl Into<String>, positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            label: label.into(),
            positions,
            indices,
            gpu: GpuObjects::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Size of the vertex and index data as uploaded to a backend.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        self.positions.len() * std::mem::size_of::<[f32; 3]>()
            + self.indices.len() * std::mem::size_of::<u32>()
    }

    #[inline]
    #[must_use]
    pub fn gpu(&self) -> &GpuObjects {
        &self.gpu
    }
}

/// Geometry plus an optional texture, attached to a node.
///
/// Cloning only bumps the geometry's reference count.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub geometry: Arc<Geometry>,
    pub texture: Option<TextureHandle>,
}

/// One node of a template. Children are indices into [`SceneTemplate::nodes`].
#[derive(Debug, Clone, Default)]
pub struct TemplateNode {
    pub name: Option<String>,
    pub transform: Transform,
    pub children: Vec<usize>,
    pub drawable: Option<Drawable>,
    pub world_space: bool,
}

/// Immutable node graph for one asset. Node 0 is the root.
#[derive(Debug)]
pub struct SceneTemplate {
    name: String,
    nodes: Vec<TemplateNode>,
}

impl SceneTemplate {
    /// Builds a template, rejecting anything that is not a single tree rooted at node 0.
    pub fn new(name: impl Into<String>, nodes: Vec<TemplateNode>) -> Result<Self> {
        let name = name.into();
        if nodes.is_empty() {
            return Err(EmberError::format(name, "template has no nodes"));
        }

        let mut parent_count = vec![0usize; nodes.len()];
        for (index, node) in nodes.iter().enumerate() {
            for &child in &node.children {
                if child >= nodes.len() {
                    return Err(EmberError::format(
                        name,
                        format!("node {index} references missing child {child}"),
                    ));
                }
                parent_count[child] += 1;
            }
        }

        if parent_count[0] != 0 {
            return Err(EmberError::format(name, "root node has a parent"));
        }
        if let Some(index) = parent_count.iter().skip(1).position(|&c| c != 1) {
            return Err(EmberError::format(
                name,
                format!("node {} must have exactly one parent", index + 1),
            ));
        }

        let template = Self { name, nodes };
        // One parent per node can still form a detached cycle.
        if template.preorder().len() != template.nodes.len() {
            return Err(EmberError::format(template.name, "hierarchy contains a cycle"));
        }
        Ok(template)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &TemplateNode {
        &self.nodes[0]
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name.as_deref() == Some(name))
    }

    /// Node indices in depth-first pre-order, children in declaration order.
    #[must_use]
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![0usize];
        while let Some(index) = stack.pop() {
            if order.len() > self.nodes.len() {
                break;
            }
            order.push(index);
            stack.extend(self.nodes[index].children.iter().rev().copied());
        }
        order
    }

    /// Child counts in pre-order. Two trees with equal shapes have the same topology.
    #[must_use]
    pub fn shape(&self) -> Vec<usize> {
        self.preorder()
            .into_iter()
            .map(|i| self.nodes[i].children.len())
            .collect()
    }

    /// Distinct geometries referenced by this template.
    pub fn geometries(&self) -> impl Iterator<Item = &Arc<Geometry>> {
        let mut seen = FxHashSet::default();
        self.nodes
            .iter()
            .filter_map(|n| n.drawable.as_ref().map(|d| &d.geometry))
            .filter(move |g| seen.insert(Arc::as_ptr(g)))
    }

    /// Drops every GPU object tied to `context`. CPU data is untouched.
    pub fn release_gpu_objects(&self, context: ContextId) -> usize {
        self.geometries()
            .filter(|g| g.gpu().release(context).is_some())
            .count()
    }
}
