//! Transform system
//!
//! Propagates local matrices into world matrices. Works on the node map
//! directly instead of the whole [`Scene`](crate::Scene) to keep borrows narrow.
//!
//! World-space nodes carry a frozen parent frame (`world_anchor`) and use it
//! in place of their live parent's world matrix.

use glam::Affine3A;
use slotmap::SlotMap;

use crate::NodeHandle;
use crate::node::Node;

/// Updates the world matrices of every tree in `roots`.
pub fn update_hierarchy(nodes: &mut SlotMap<NodeHandle, Node>, roots: &[NodeHandle]) {
    for &root in roots {
        update_subtree(nodes, root, Affine3A::IDENTITY, false);
    }
}

/// Updates one subtree, given the world matrix of its parent and whether
/// that matrix changed since the last pass.
///
/// Uses an explicit stack so deep skeletons cannot overflow.
pub fn update_subtree(
    nodes: &mut SlotMap<NodeHandle, Node>,
    root: NodeHandle,
    parent_world: Affine3A,
    parent_changed: bool,
) {
    // (node, parent world matrix, parent changed)
    let mut stack: Vec<(NodeHandle, Affine3A, bool)> = Vec::with_capacity(64);
    stack.push((root, parent_world, parent_changed));

    while let Some((handle, parent_world, parent_changed)) = stack.pop() {
        let Some(node) = nodes.get_mut(handle) else {
            continue;
        };

        let local_changed = node.transform.update_local_matrix();
        let (base, base_changed) = match node.world_anchor {
            Some(anchor) => (anchor, false),
            None => (parent_world, parent_changed),
        };
        let world_changed = local_changed || base_changed;

        if world_changed {
            let world = base * *node.transform.local_matrix();
            node.transform.set_world_matrix(world);
        }

        let current_world = node.transform.world_matrix;
        for &child in node.children.iter().rev() {
            stack.push((child, current_world, world_changed));
        }
    }
}
