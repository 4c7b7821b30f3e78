//! Cascade priority planning.
//!
//! The cascade walks children sequentially and hands each one its share of
//! what is left. That is only exact if children that will hit a bound are
//! visited before the ones that can absorb the remainder, so every child is
//! keyed by its *slack*: room before the bound divided by the weight it
//! receives space with. Lowest slack goes first.
//!
//! | Mode     | Room                   | Weight              |
//! |----------|------------------------|---------------------|
//! | Compress | `max(0, base - min)`   | `compress_capacity` |
//! | Expand   | `max(0, max - base)`   | expand ratio        |
//!
//! A child with zero weight never moves, so its slack is infinite. Ties keep
//! link order.

use crate::segment::{Ratios, Validated};
use crate::space::Space;
use crate::tree::{NodeId, SegmentTree};

/// Room divided by weight; infinite when the weight is not positive.
#[inline]
pub fn slack(room: f32, weight: f32) -> f32 {
    if weight > 0.0 {
        room / weight
    } else {
        f32::INFINITY
    }
}

/// Compression slack of a child.
#[inline]
pub fn compress_slack(v: &Validated) -> f32 {
    slack((v.base - v.min).max(0.0), v.compress_capacity)
}

/// Expansion slack of a child.
#[inline]
pub fn expand_slack(v: &Validated, ratios: &Ratios) -> f32 {
    slack((v.max - v.base).max(0.0), ratios.expand)
}

/// Indices of `keys`, ascending, stable on ties.
pub fn ascending(keys: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    order
}

/// Compress and expand visiting orders for `(validated, ratios)` of each
/// child in link order.
pub fn priorities<'a>(
    children: impl IntoIterator<Item = (&'a Validated, &'a Ratios)>,
) -> (Vec<usize>, Vec<usize>) {
    let (compress, expand): (Vec<f32>, Vec<f32>) = children
        .into_iter()
        .map(|(v, ratios)| (compress_slack(v), expand_slack(v, ratios)))
        .unzip();
    (ascending(&compress), ascending(&expand))
}

impl<S: Space> SegmentTree<S> {
    /// Rebuild a node's compress and expand visiting orders.
    pub(crate) fn plan(&mut self, id: NodeId) {
        let node = self.node(id);
        let main = node.config.flow.main_axis().index();
        let (compress, expand) = priorities(node.children.iter().map(|&c| {
            let child = self.node(c);
            (&child.validated[main], &child.ratios)
        }));

        let node = self.node_mut(id);
        node.compress_priority = compress;
        node.expand_priority = expand;
    }
}
