use std::sync::atomic::{AtomicU32, Ordering};

use ember_core::interner;
use glam::Affine3A;
use slotmap::SlotMap;

use crate::NodeHandle;
use crate::node::Node;
use crate::transform_system;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

/// Scene graph
///
/// Owns every live node. Instances created from templates live here as
/// ordinary subtrees; removing the subtree destroys the instance.
pub struct Scene {
    pub id: u32,

    pub(crate) nodes: SlotMap<NodeHandle, Node>,
    pub root_nodes: Vec<NodeHandle>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed),
            nodes: SlotMap::with_key(),
            root_nodes: Vec::new(),
        }
    }

    pub fn create_node(&mut self) -> NodeHandle {
        self.add_node(Node::new())
    }

    pub fn create_node_with_name(&mut self, name: &str) -> NodeHandle {
        self.add_node(Node::with_name(name))
    }

    /// Adds a node as a scene root.
    pub fn add_node(&mut self, node: Node) -> NodeHandle {
        let handle = self.nodes.insert(node);
        self.root_nodes.push(handle);
        handle
    }

    pub fn add_to_parent(&mut self, child: Node, parent: NodeHandle) -> NodeHandle {
        let handle = self.nodes.insert(child);
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(handle);
            if let Some(c) = self.nodes.get_mut(handle) {
                c.parent = Some(parent);
            }
        } else {
            self.root_nodes.push(handle);
        }
        handle
    }

    #[inline]
    #[must_use]
    pub fn get_node(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    #[inline]
    pub fn get_node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node> {
        self.nodes.get_mut(handle)
    }

    #[must_use]
    pub fn get_name(&self, handle: NodeHandle) -> Option<&'static str> {
        self.nodes.get(handle).and_then(Node::name)
    }

    pub fn set_name(&mut self, handle: NodeHandle, name: &str) {
        if let Some(node) = self.nodes.get_mut(handle) {
            node.set_name(name);
        }
    }

    #[inline]
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Moves `child` under `parent`, detaching it from wherever it was.
    ///
    /// Refuses to create a cycle (attaching a node below its own descendant).
    pub fn attach(&mut self, child: NodeHandle, parent: NodeHandle) {
        if child == parent || !self.nodes.contains_key(child) || !self.nodes.contains_key(parent)
        {
            return;
        }
        if self.is_ancestor(child, parent) {
            log::warn!("Refusing to attach a node below its own descendant");
            return;
        }

        self.detach(child);
        self.root_nodes.retain(|&h| h != child);

        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = Some(parent);
            c.transform.mark_dirty();
        }
    }

    /// Detaches `child` from its parent and makes it a scene root.
    pub fn detach(&mut self, child: NodeHandle) {
        let Some(parent) = self.nodes.get(child).and_then(|n| n.parent) else {
            return;
        };
        if let Some(p) = self.nodes.get_mut(parent) {
            p.children.retain(|&h| h != child);
        }
        if let Some(c) = self.nodes.get_mut(child) {
            c.parent = None;
            c.transform.mark_dirty();
        }
        self.root_nodes.push(child);
    }

    /// Whether `ancestor` is on the parent chain of `node`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeHandle, node: NodeHandle) -> bool {
        let mut current = self.nodes.get(node).and_then(|n| n.parent);
        while let Some(handle) = current {
            if handle == ancestor {
                return true;
            }
            current = self.nodes.get(handle).and_then(|n| n.parent);
        }
        false
    }

    /// Removes a node and its whole subtree.
    pub fn remove_node(&mut self, handle: NodeHandle) {
        if !self.nodes.contains_key(handle) {
            return;
        }

        match self.nodes.get(handle).and_then(|n| n.parent) {
            Some(parent) => {
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.retain(|&h| h != handle);
                }
            }
            None => self.root_nodes.retain(|&h| h != handle),
        }

        for h in self.subtree(handle) {
            self.nodes.remove(h);
        }
    }

    /// Handles of `root` and all its descendants in depth-first pre-order.
    #[must_use]
    pub fn subtree(&self, root: NodeHandle) -> Vec<NodeHandle> {
        let mut out = Vec::new();
        if !self.nodes.contains_key(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            out.push(handle);
            if let Some(node) = self.nodes.get(handle) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// First node named `name` in the subtree of `root` (pre-order).
    #[must_use]
    pub fn find_node_by_name(&self, root: NodeHandle, name: &str) -> Option<NodeHandle> {
        let symbol = interner::get(name)?;
        let mut stack = vec![root];
        while let Some(handle) = stack.pop() {
            let node = self.nodes.get(handle)?;
            if node.name == Some(symbol) {
                return Some(handle);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        None
    }

    /// Computes a node's world matrix from the current TRS of its parent chain.
    ///
    /// Unlike [`Node::world_matrix`] this does not depend on the last
    /// [`update_world_transforms`](Self::update_world_transforms) pass.
    #[must_use]
    pub fn compute_world_matrix(&self, handle: NodeHandle) -> Option<Affine3A> {
        let node = self.nodes.get(handle)?;
        let local = node.transform.to_affine();
        if let Some(anchor) = node.world_anchor {
            return Some(anchor * local);
        }
        match node.parent {
            Some(parent) => Some(self.compute_world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Propagates local transforms down the hierarchy into world matrices.
    pub fn update_world_transforms(&mut self) {
        transform_system::update_hierarchy(&mut self.nodes, &self.root_nodes);
    }

    /// Same as [`update_world_transforms`](Self::update_world_transforms) for one subtree.
    pub fn update_subtree(&mut self, root: NodeHandle) {
        let parent_world = self
            .nodes
            .get(root)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map_or(Affine3A::IDENTITY, |p| p.transform.world_matrix);
        transform_system::update_subtree(&mut self.nodes, root, parent_world, true);
    }
}
