//! Offset assignment.
//!
//! Placing is independent of sizing: it reads final sizes and writes only
//! positions, so reordering siblings and placing again never changes a size.

use crate::Axis;
use crate::space::Space;
use crate::tree::{NodeId, SegmentTree, TreeError};

impl<S: Space> SegmentTree<S> {
    /// Assign positions to every node below `root`, with `root` at the
    /// origin.
    ///
    /// Children are laid out by ascending `order` (link order on ties),
    /// starting at their parent's main position. On the cross axis every
    /// child starts at the parent's cross position.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleNode`] if `root` is not live.
    pub fn placing(&mut self, root: NodeId) -> Result<(), TreeError> {
        self.placing_at(root, 0.0, 0.0)
    }

    /// Like [`placing`](Self::placing), with `root` at `(x, y)`.
    ///
    /// One-dimensional trees use only `x`.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleNode`] if `root` is not live.
    pub fn placing_at(&mut self, root: NodeId, x: f32, y: f32) -> Result<(), TreeError> {
        self.check(root)?;
        let output = &mut self.node_mut(root).output;
        output[Axis::Horizontal.index()].position = x;
        output[Axis::Vertical.index()].position = y;
        self.place_children(root);
        Ok(())
    }

    fn place_children(&mut self, id: NodeId) {
        let node = self.node(id);
        let (main, cross) = S::axes(node.config.flow);
        let mut cursor = node.output[main.index()].position;
        let cross_position = cross.map(|c| node.output[c.index()].position);

        for child in self.placement_order(id) {
            let out = &mut self.node_mut(child).output;
            out[main.index()].position = cursor;
            cursor += out[main.index()].size;
            if let (Some(axis), Some(position)) = (cross, cross_position) {
                out[axis.index()].position = position;
            }
            self.place_children(child);
        }
    }

    /// Children of `id` sorted by placement order.
    #[must_use]
    pub fn placement_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.children(id).to_vec();
        children.sort_by_key(|&c| self.node(c).order);
        children
    }

    /// Set the placement order of the direct child of `root` named `name`.
    ///
    /// Returns `false` when there is no such child. Takes effect at the next
    /// [`placing`](Self::placing).
    pub fn set_order(&mut self, root: NodeId, name: &str, order: u32) -> bool {
        match self.child_by_name(root, name) {
            Some(child) => {
                self.node_mut(child).order = order;
                true
            }
            None => false,
        }
    }

    /// Set the placement order of a node by handle.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleNode`] if `id` is not live.
    pub fn set_order_of(&mut self, id: NodeId, order: u32) -> Result<(), TreeError> {
        self.check(id)?;
        self.node_mut(id).order = order;
        Ok(())
    }
}
