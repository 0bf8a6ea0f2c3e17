use ember_core::interner::{self, Symbol};
use glam::Affine3A;

use crate::NodeHandle;
use crate::template::{Drawable, TemplateNode};
use crate::transform::Transform;

/// A scene node.
///
/// Nodes form a tree through `parent` / `children`. A node copied from a
/// template keeps the template's name and drawable; its transform is its own.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,

    pub(crate) name: Option<Symbol>,

    pub transform: Transform,

    /// Shared, immutable geometry (if any).
    pub drawable: Option<Drawable>,

    pub visible: bool,

    /// Node lives in world space: on attach its parent frame is frozen into
    /// `world_anchor` and later parent moves no longer affect it.
    pub(crate) world_space: bool,
    pub(crate) world_anchor: Option<Affine3A>,
}

impl Node {
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            name: None,
            transform: Transform::new(),
            drawable: None,
            visible: true,
            world_space: false,
            world_anchor: None,
        }
    }

    #[must_use]
    pub fn with_name(name: &str) -> Self {
        Self {
            name: Some(interner::intern(name)),
            ..Self::new()
        }
    }

    /// Value copy of a template node, without hierarchy links.
    pub(crate) fn from_template(node: &TemplateNode) -> Self {
        let mut transform = Transform::from_trs(
            node.transform.position,
            node.transform.rotation,
            node.transform.scale,
        );
        transform.mark_dirty();

        Self {
            parent: None,
            children: Vec::with_capacity(node.children.len()),
            name: node.name.as_deref().map(interner::intern),
            transform,
            drawable: node.drawable.clone(),
            visible: true,
            world_space: node.world_space,
            world_anchor: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> Option<&'static str> {
        self.name.map(interner::resolve)
    }

    #[inline]
    #[must_use]
    pub fn name_symbol(&self) -> Option<Symbol> {
        self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = Some(interner::intern(name));
    }

    #[inline]
    #[must_use]
    pub fn is_world_space(&self) -> bool {
        self.world_space
    }

    /// Parent frame frozen at attach time, for world-space nodes.
    #[inline]
    #[must_use]
    pub fn world_anchor(&self) -> Option<&Affine3A> {
        self.world_anchor.as_ref()
    }

    /// World matrix as of the last [`Scene::update_world_transforms`](crate::Scene::update_world_transforms).
    #[inline]
    #[must_use]
    pub fn world_matrix(&self) -> &Affine3A {
        &self.transform.world_matrix
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}
