//! Instancing
//!
//! Turns an immutable [`SceneTemplate`] into a live, independently animatable
//! subtree of a [`Scene`]. The copy is structural: every template node becomes
//! a fresh [`Node`] with its own transform, while geometry stays shared through
//! its `Arc`. The instance keeps no reference back to the template.

use ember_core::{EmberError, Result};
use rustc_hash::FxHashMap;

use crate::NodeHandle;
use crate::node::Node;
use crate::scene::Scene;
use crate::template::SceneTemplate;

impl Scene {
    /// Copies `template` into the scene as a new root and returns the instance root.
    pub fn instantiate(&mut self, template: &SceneTemplate) -> NodeHandle {
        let handles: Vec<NodeHandle> = template
            .nodes()
            .iter()
            .map(|node| self.nodes.insert(Node::from_template(node)))
            .collect();

        for (index, template_node) in template.nodes().iter().enumerate() {
            let parent = handles[index];
            for &child_index in &template_node.children {
                let child = handles[child_index];
                if let Some(c) = self.nodes.get_mut(child) {
                    c.parent = Some(parent);
                }
                if let Some(p) = self.nodes.get_mut(parent) {
                    p.children.push(child);
                }
            }
        }

        let root = handles[0];
        self.root_nodes.push(root);
        log::debug!(
            "Instantiated '{}' ({} nodes) into scene {}",
            template.name(),
            handles.len(),
            self.id
        );
        root
    }

    /// Attaches a freshly created instance below `parent`.
    ///
    /// `parent` must already be at its final pose: world-space nodes of the
    /// instance are baked against the parent's current world matrix and do not
    /// follow it afterwards.
    pub fn attach_instance(&mut self, instance: NodeHandle, parent: NodeHandle) -> Result<()> {
        let node = self.nodes.get(instance).ok_or(EmberError::InvalidNode)?;
        if node.parent.is_some() {
            return Err(EmberError::AlreadyAttached);
        }
        if !self.nodes.contains_key(parent) || instance == parent {
            return Err(EmberError::InvalidNode);
        }

        self.attach(instance, parent);

        for handle in self.subtree(instance) {
            let is_world_space = self.nodes.get(handle).is_some_and(Node::is_world_space);
            if !is_world_space {
                continue;
            }
            let anchor = self
                .nodes
                .get(handle)
                .and_then(|n| n.parent)
                .and_then(|p| self.compute_world_matrix(p));
            if let Some(node) = self.nodes.get_mut(handle) {
                node.world_anchor = anchor;
                node.transform.mark_dirty();
            }
        }
        Ok(())
    }

    /// Verifies that the subtree at `root` still has the layout of `template`.
    ///
    /// A mismatch means the instance is stale; it must be recreated, not patched.
    pub fn check_topology(&self, root: NodeHandle, template: &SceneTemplate) -> Result<()> {
        if !self.nodes.contains_key(root) {
            return Err(EmberError::InvalidNode);
        }
        let found: Vec<usize> = self
            .subtree(root)
            .into_iter()
            .filter_map(|h| self.nodes.get(h).map(|n| n.children.len()))
            .collect();
        let expected = template.shape();

        if found == expected {
            Ok(())
        } else {
            Err(EmberError::TopologyMismatch {
                expected: format!("'{}' with {} nodes", template.name(), expected.len()),
                found: format!("instance with {} nodes", found.len()),
            })
        }
    }

    /// Copies local transforms from one instance to another, matching nodes by name.
    ///
    /// Returns how many nodes were updated. Unnamed nodes and names missing
    /// from `src_root` are left alone.
    pub fn copy_pose(&mut self, src_root: NodeHandle, dst_root: NodeHandle) -> usize {
        let source: FxHashMap<_, _> = self
            .subtree(src_root)
            .into_iter()
            .filter_map(|h| {
                let node = self.nodes.get(h)?;
                Some((node.name?, node.transform.clone()))
            })
            .collect();

        let mut copied = 0;
        for handle in self.subtree(dst_root) {
            let Some(node) = self.nodes.get_mut(handle) else {
                continue;
            };
            if let Some(transform) = node.name.and_then(|name| source.get(&name)) {
                node.transform.copy_trs_from(transform);
                copied += 1;
            }
        }
        copied
    }
}
