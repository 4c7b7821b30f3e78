//! Segment tree arena and structural operations.
//!
//! # Design
//!
//! Nodes live in a slot arena addressed by [`NodeId`]. Parent and child
//! relations are handle pairs, not ownership: destroying a node detaches its
//! children instead of destroying them. Every handle carries the generation
//! of its slot, so a handle that outlives its node is rejected with
//! [`TreeError::StaleNode`] rather than aliasing whatever reuses the slot.
//!
//! ## Cached Metrics
//!
//! Each node caches the fold of its children (accumulated metrics), its own
//! clamped metrics (validated), and two priority orders over its children.
//! They are refreshed explicitly:
//!
//! - [`SegmentTree::recompute`] runs the single-node pipeline
//!   (aggregate → validate → plan).
//! - Structural edits call `propagate`, which runs the pipeline on the edited
//!   node and then on every ancestor up to the root.
//!
//! Sizing and placing only write outputs. A `Percent` length is cached
//! against the parent size at link time; the cascade resolves it against the
//! parent's current size without touching the cache.
//!
//! ### Complexity
//!
//! | Operation       | Time                         |
//! |-----------------|------------------------------|
//! | Create node     | O(1) amortized               |
//! | Link / unlink   | O(Σ children along the path to the root, × log for planning) |
//! | Destroy         | O(children + path)           |
//! | Name lookup     | O(1)                         |
//! | Cycle check     | O(depth)                     |

use crate::debug::CascadeRecorder;
use crate::segment::{
    Accumulated, AxisSegment, NodeConfig, Ratios, Validated, validate_axis, validate_ratios,
};
use crate::space::Space;
use crate::Axis;
use rustc_hash::FxHashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

// ============================================================================
// NodeId
// ============================================================================

/// Generation-checked handle into a [`SegmentTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index.
    #[must_use]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation at the time the handle was issued.
    #[must_use]
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}v{}", self.index, self.generation)
    }
}

// ============================================================================
// TreeError
// ============================================================================

/// Error returned by structural and sizing operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The handle's node was destroyed.
    StaleNode(NodeId),
    /// Linking would make `child` an ancestor of itself.
    Cycle { parent: NodeId, child: NodeId },
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleNode(id) => write!(f, "stale segment handle {id}"),
            Self::Cycle { parent, child } => write!(
                f,
                "segment cycle detected: linking {child} under {parent} would make it its own ancestor"
            ),
        }
    }
}

impl std::error::Error for TreeError {}

// ============================================================================
// SegmentNode
// ============================================================================

/// Per-node state. Arrays are indexed by [`Axis::index`].
#[derive(Debug, Clone, Default)]
pub(crate) struct SegmentNode {
    pub(crate) config: NodeConfig,
    /// Placement order; starts at `config.order`, changed by `set_order`.
    pub(crate) order: u32,
    pub(crate) ratios: Ratios,
    pub(crate) validated: [Validated; 2],
    pub(crate) accumulated: [Accumulated; 2],
    pub(crate) output: [AxisSegment; 2],
    /// Parent size at link time; cached `Percent` metrics resolve against it.
    pub(crate) percent_basis: [f32; 2],
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Rebuilt on every aggregation pass; first occurrence of a name wins.
    pub(crate) children_by_name: FxHashMap<String, usize>,
    /// Child indices, least compress slack first.
    pub(crate) compress_priority: Vec<usize>,
    /// Child indices, least expand slack first.
    pub(crate) expand_priority: Vec<usize>,
}

impl SegmentNode {
    fn new(config: NodeConfig) -> Self {
        Self {
            order: config.order,
            config,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    alive: bool,
    node: SegmentNode,
}

// ============================================================================
// SegmentTree
// ============================================================================

/// Arena of segments with cached per-node metrics.
///
/// # Examples
///
/// ```
/// use discadelta_layout::{LinearTree, SegmentConfig, TreeError};
///
/// let mut tree = LinearTree::new();
/// let root = tree.create(SegmentConfig::new("root", 0.0));
/// let child = tree.create(SegmentConfig::new("child", 120.0));
/// tree.link(root, child).unwrap();
/// assert_eq!(tree.accumulated(root, discadelta_layout::Axis::Horizontal).unwrap().base, 120.0);
///
/// // Linking a node under its own descendant is rejected.
/// assert!(matches!(tree.link(child, root), Err(TreeError::Cycle { .. })));
///
/// tree.destroy(child).unwrap();
/// assert_eq!(tree.unlink(child), Err(TreeError::StaleNode(child)));
/// ```
pub struct SegmentTree<S: Space> {
    slots: Vec<Slot>,
    /// Free list for recycled slots.
    free_list: Vec<u32>,
    live: usize,
    pub(crate) recorder: Option<Arc<CascadeRecorder>>,
    _space: PhantomData<S>,
}

impl<S: Space> SegmentTree<S> {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a tree with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(node_cap: usize) -> Self {
        Self {
            slots: Vec::with_capacity(node_cap),
            free_list: Vec::new(),
            live: 0,
            recorder: None,
            _space: PhantomData,
        }
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether the tree has no live nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Whether `id` refers to a live node of this tree.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation)
    }

    /// Iterate all live handles in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.alive)
            .map(|(i, slot)| NodeId {
                index: i as u32,
                generation: slot.generation,
            })
    }

    /// Attach a recorder that captures every cascade decision.
    pub fn set_recorder(&mut self, recorder: Option<Arc<CascadeRecorder>>) {
        self.recorder = recorder;
    }

    pub(crate) fn check(&self, id: NodeId) -> Result<(), TreeError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(TreeError::StaleNode(id))
        }
    }

    /// Internal access for handles already known to be live.
    #[inline]
    pub(crate) fn node(&self, id: NodeId) -> &SegmentNode {
        &self.slots[id.index as usize].node
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut SegmentNode {
        &mut self.slots[id.index as usize].node
    }

    fn get(&self, id: NodeId) -> Option<&SegmentNode> {
        self.contains(id).then(|| self.node(id))
    }

    // ── Structural operations ──────────────────────────────────────

    /// Create a detached node. Its metrics are computed immediately.
    pub fn create(&mut self, config: S::Config) -> NodeId {
        let node = SegmentNode::new(S::node_config(config));
        let id = if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            slot.node = node;
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                alive: true,
                node,
            });
            NodeId {
                index,
                generation: 0,
            }
        };
        self.live += 1;
        self.recompute_node(id);
        id
    }

    /// Replace a node's configuration and refresh it and its ancestors.
    ///
    /// Resets the placement order to the new config's order.
    pub fn update_config(&mut self, id: NodeId, config: S::Config) -> Result<(), TreeError> {
        self.check(id)?;
        let config = S::node_config(config);
        let node = self.node_mut(id);
        node.order = config.order;
        node.config = config;
        self.propagate(id);
        Ok(())
    }

    /// Attach `child` as the last child of `parent`.
    ///
    /// Self-links and links to the current parent are ignored. A child linked
    /// elsewhere is detached from its old parent first.
    pub fn link(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        self.check(parent)?;
        self.check(child)?;
        if parent == child {
            tracing::debug!(node = %child, "link ignored: self link");
            return Ok(());
        }
        if self.node(child).parent == Some(parent) {
            tracing::debug!(%parent, %child, "link ignored: already linked");
            return Ok(());
        }
        if self.is_ancestor(child, parent) {
            return Err(TreeError::Cycle { parent, child });
        }
        if self.node(child).parent.is_some() {
            self.unlink(child)?;
        }

        let output = self.node(parent).output;
        self.node_mut(parent).children.push(child);
        let node = self.node_mut(child);
        node.parent = Some(parent);
        let basis = [output[0].size, output[1].size];
        if node.percent_basis != basis {
            node.percent_basis = basis;
            self.recompute_node(child);
        }
        self.propagate(parent);
        Ok(())
    }

    /// Detach `child` from its parent. Unlinking a root is ignored.
    pub fn unlink(&mut self, child: NodeId) -> Result<(), TreeError> {
        self.check(child)?;
        let Some(parent) = self.node(child).parent else {
            tracing::debug!(node = %child, "unlink ignored: already a root");
            return Ok(());
        };
        self.node_mut(parent).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
        self.propagate(parent);
        Ok(())
    }

    /// Detach every child (they survive as roots), unlink the node, and free
    /// its slot.
    pub fn destroy(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        let children = std::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        self.unlink(id)?;

        let slot = &mut self.slots[id.index as usize];
        slot.alive = false;
        slot.generation = slot.generation.wrapping_add(1);
        slot.node = SegmentNode::default();
        self.free_list.push(id.index);
        self.live -= 1;
        Ok(())
    }

    /// Rerun the metrics pipeline on one node without touching ancestors.
    pub fn recompute(&mut self, id: NodeId) -> Result<(), TreeError> {
        self.check(id)?;
        self.recompute_node(id);
        Ok(())
    }

    /// Aggregate → validate → plan for a single node.
    pub(crate) fn recompute_node(&mut self, id: NodeId) {
        self.aggregate(id);
        self.validate(id);
        self.plan(id);
    }

    /// Recompute `id` and every ancestor, bottom-up.
    pub(crate) fn propagate(&mut self, id: NodeId) {
        let mut current = Some(id);
        while let Some(node) = current {
            self.recompute_node(node);
            tracing::trace!(%node, "metrics recomputed");
            current = self.node(node).parent;
        }
    }

    /// Refresh a node's own validated metrics from its accumulated ones.
    pub(crate) fn validate(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        node.ratios = validate_ratios(node.config.compress_ratio, node.config.expand_ratio);
        let (main, cross) = S::axes(node.config.flow);
        for axis in std::iter::once(main).chain(cross) {
            let i = axis.index();
            node.validated[i] = validate_axis(
                &node.config.axes[i],
                &node.accumulated[i],
                node.percent_basis[i],
                node.ratios.compress,
            );
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.node(id).parent;
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.node(node).parent;
        }
        false
    }

    // ── Read accessors ─────────────────────────────────────────────

    /// Parent of a node, if linked.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    /// Children in link order. Empty for stale handles.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Direct child with the given name.
    #[must_use]
    pub fn child_by_name(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let node = self.get(id)?;
        node.children_by_name
            .get(name)
            .map(|&index| node.children[index])
    }

    /// Name of a node.
    #[must_use]
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|node| node.config.name.as_str())
    }

    /// Stored configuration of a node.
    #[must_use]
    pub fn config(&self, id: NodeId) -> Option<&NodeConfig> {
        self.get(id).map(|node| &node.config)
    }

    /// Current placement order of a node.
    #[must_use]
    pub fn order(&self, id: NodeId) -> Option<u32> {
        self.get(id).map(|node| node.order)
    }

    /// Number of ancestors (0 for a root).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        let mut current = self.get(id)?.parent;
        let mut depth = 0;
        while let Some(node) = current {
            depth += 1;
            current = self.node(node).parent;
        }
        Some(depth)
    }

    /// Topmost ancestor (the node itself for a root).
    #[must_use]
    pub fn root_of(&self, id: NodeId) -> Option<NodeId> {
        let mut root = id;
        while let Some(parent) = self.get(root)?.parent {
            root = parent;
        }
        Some(root)
    }

    /// Number of descendants below a node.
    #[must_use]
    pub fn branch_count(&self, id: NodeId) -> Option<usize> {
        let mut stack: Vec<NodeId> = self.get(id)?.children.clone();
        let mut count = 0;
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend_from_slice(&self.node(node).children);
        }
        Some(count)
    }

    /// Clamped metrics along an axis.
    #[must_use]
    pub fn validated(&self, id: NodeId, axis: Axis) -> Option<Validated> {
        self.get(id).map(|node| node.validated[axis.index()])
    }

    /// Children fold along an axis.
    #[must_use]
    pub fn accumulated(&self, id: NodeId, axis: Axis) -> Option<Accumulated> {
        self.get(id).map(|node| node.accumulated[axis.index()])
    }

    /// Clamped elastic ratios.
    #[must_use]
    pub fn ratios(&self, id: NodeId) -> Option<Ratios> {
        self.get(id).map(|node| node.ratios)
    }

    /// Child indices in compress cascade order.
    #[must_use]
    pub fn compress_priority(&self, id: NodeId) -> &[usize] {
        self.get(id)
            .map_or(&[], |node| node.compress_priority.as_slice())
    }

    /// Child indices in expand cascade order.
    #[must_use]
    pub fn expand_priority(&self, id: NodeId) -> &[usize] {
        self.get(id)
            .map_or(&[], |node| node.expand_priority.as_slice())
    }

    /// Output along an axis.
    #[must_use]
    pub fn axis_segment(&self, id: NodeId, axis: Axis) -> Option<AxisSegment> {
        self.get(id).map(|node| node.output[axis.index()])
    }

    /// Output view of a node.
    #[must_use]
    pub fn segment(&self, id: NodeId) -> Option<S::Segment> {
        self.get(id)
            .map(|node| S::segment(&node.config, node.order, &node.output))
    }
}

impl<S: Space> Default for SegmentTree<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Space> fmt::Debug for SegmentTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SegmentTree")
            .field("live", &self.live)
            .field("slots", &self.slots.len())
            .field("free", &self.free_list.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
