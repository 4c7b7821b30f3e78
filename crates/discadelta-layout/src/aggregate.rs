//! Children aggregation.
//!
//! Along a node's main axis children are stacked, so their metrics add up.
//! Along the cross axis every child spans the full extent, so the node needs
//! only as much as its largest child.
//!
//! | Field               | Main axis (`Sum`)            | Cross axis (`Max`) |
//! |---------------------|------------------------------|--------------------|
//! | `base`              | Σ base                       | max base           |
//! | `min`               | Σ max(min, compress_solidify) | max min           |
//! | `compress_solidify` | Σ compress_solidify          | 0                  |
//! | `expand_ratio`      | Σ expand ratio               | 0                  |

use crate::segment::{Accumulated, Validated};
use crate::space::Space;
use crate::tree::{NodeId, SegmentTree};
use rustc_hash::FxHashMap;

/// How children combine along an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// Children are stacked along this axis.
    Sum,
    /// Children overlap along this axis.
    Max,
}

/// Fold `(validated, expand_ratio)` pairs of children into accumulated
/// metrics.
pub fn fold(kind: Fold, children: impl IntoIterator<Item = (Validated, f32)>) -> Accumulated {
    let mut acc = Accumulated::default();
    for (v, expand_ratio) in children {
        match kind {
            Fold::Sum => {
                acc.base += v.base;
                acc.min += v.min.max(v.compress_solidify);
                acc.compress_solidify += v.compress_solidify;
                acc.expand_ratio += expand_ratio;
            }
            Fold::Max => {
                acc.base = acc.base.max(v.base);
                acc.min = acc.min.max(v.min);
            }
        }
    }
    acc
}

impl<S: Space> SegmentTree<S> {
    /// Refresh a node's accumulated metrics and its name index from its
    /// children's current validated metrics.
    pub(crate) fn aggregate(&mut self, id: NodeId) {
        let node = self.node(id);
        let (main, cross) = S::axes(node.config.flow);

        let mut accumulated = [Accumulated::default(); 2];
        let children = node.children.iter().map(|&c| self.node(c));
        accumulated[main.index()] = fold(
            Fold::Sum,
            children
                .clone()
                .map(|child| (child.validated[main.index()], child.ratios.expand)),
        );
        if let Some(cross) = cross {
            accumulated[cross.index()] = fold(
                Fold::Max,
                children.map(|child| (child.validated[cross.index()], child.ratios.expand)),
            );
        }

        let mut by_name = FxHashMap::default();
        for (index, &child) in node.children.iter().enumerate() {
            by_name
                .entry(self.node(child).config.name.clone())
                .or_insert(index);
        }

        let node = self.node_mut(id);
        node.accumulated = accumulated;
        node.children_by_name = by_name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Axis, Flow, Length, LinearTree, RectSegmentConfig, RectTree, SegmentConfig};

    fn v(base: f32, min: f32, solidify: f32) -> Validated {
        Validated {
            min,
            max: f32::MAX,
            base,
            compress_capacity: base - solidify,
            compress_solidify: solidify,
        }
    }

    #[test]
    fn sum_fold() {
        let acc = fold(
            Fold::Sum,
            [(v(100.0, 10.0, 30.0), 1.0), (v(50.0, 20.0, 5.0), 2.0)],
        );
        assert_eq!(acc.base, 150.0);
        assert_eq!(acc.min, 50.0);
        assert_eq!(acc.compress_solidify, 35.0);
        assert_eq!(acc.expand_ratio, 3.0);
    }

    #[test]
    fn max_fold() {
        let acc = fold(
            Fold::Max,
            [(v(100.0, 10.0, 30.0), 1.0), (v(50.0, 20.0, 5.0), 2.0)],
        );
        assert_eq!(acc.base, 100.0);
        assert_eq!(acc.min, 20.0);
        assert_eq!(acc.compress_solidify, 0.0);
        assert_eq!(acc.expand_ratio, 0.0);
    }

    #[test]
    fn empty_fold_is_zero() {
        assert_eq!(fold(Fold::Sum, []), Accumulated::default());
        assert_eq!(fold(Fold::Max, []), Accumulated::default());
    }

    #[test]
    fn linear_tree_sums_children() {
        let mut tree = LinearTree::new();
        let root = tree.create(SegmentConfig::new("root", Length::Auto));
        for (name, base, ratio) in [("a", 100.0, 0.5), ("b", 200.0, 1.0)] {
            let id = tree.create(SegmentConfig::new(name, base).compress(ratio).expand(2.0));
            tree.link(root, id).unwrap();
        }
        let acc = tree.accumulated(root, Axis::Horizontal).unwrap();
        assert_eq!(acc.base, 300.0);
        assert_eq!(acc.compress_solidify, 50.0);
        assert_eq!(acc.min, 50.0);
        assert_eq!(acc.expand_ratio, 4.0);
        assert_eq!(
            tree.accumulated(root, Axis::Vertical),
            Some(Accumulated::default())
        );
    }

    #[test]
    fn rect_tree_folds_cross_axis_by_max() {
        let mut tree = RectTree::new();
        let root = tree.create(RectSegmentConfig::new("root", Flow::Column));
        let a = tree.create(
            RectSegmentConfig::new("a", Flow::Row)
                .width(300.0)
                .height(40.0),
        );
        let b = tree.create(
            RectSegmentConfig::new("b", Flow::Row)
                .width(120.0)
                .width_bounds(150.0, f32::MAX)
                .height(60.0),
        );
        tree.link(root, a).unwrap();
        tree.link(root, b).unwrap();

        let main = tree.accumulated(root, Axis::Vertical).unwrap();
        assert_eq!(main.base, 100.0);
        let cross = tree.accumulated(root, Axis::Horizontal).unwrap();
        assert_eq!(cross.base, 300.0);
        assert_eq!(cross.min, 150.0);
        assert_eq!(cross.expand_ratio, 0.0);
        // Auto root takes its children's extent.
        assert_eq!(tree.validated(root, Axis::Horizontal).unwrap().base, 300.0);
        assert_eq!(tree.validated(root, Axis::Vertical).unwrap().base, 100.0);
    }
}
