#![forbid(unsafe_code)]

//! Elastic space partitioning: compress/expand cascades over a segment tree.
//!
//! A [`SegmentTree`] holds segments that each declare a base [`Length`],
//! elastic compress/expand ratios and min/max bounds. Structural edits keep
//! per-node aggregates current; [`SegmentTree::sizing`] then resolves a target
//! distance into exact child sizes and [`SegmentTree::placing`] assigns
//! offsets.
//!
//! The engine is written once over the [`Space`] trait and instantiated as
//! [`LinearTree`] (one axis: distance/offset) and [`RectTree`] (width/height
//! with a per-node [`Flow`]).
//!
//! ```
//! use discadelta_layout::{LinearTree, SegmentConfig, SizingOptions};
//!
//! let mut tree = LinearTree::new();
//! let root = tree.create(SegmentConfig::new("root", 0.0));
//! let a = tree.create(SegmentConfig::new("a", 100.0));
//! let b = tree.create(SegmentConfig::new("b", 100.0).expand(3.0));
//! tree.link(root, a).unwrap();
//! tree.link(root, b).unwrap();
//!
//! tree.sizing(root, 400.0, SizingOptions::default()).unwrap();
//! tree.placing(root).unwrap();
//!
//! assert_eq!(tree.segment(a).unwrap().distance, 150.0);
//! assert_eq!(tree.segment(b).unwrap().distance, 250.0);
//! assert_eq!(tree.segment(b).unwrap().offset, 150.0);
//! ```

pub mod aggregate;
pub mod cascade;
pub mod debug;
pub mod place;
pub mod priority;
pub mod segment;
pub mod space;
pub mod tree;

pub use cascade::{CascadeMode, SizingOptions, SizingReport};
pub use discadelta_core::geometry::Rect;
pub use segment::{
    Accumulated, AxisConfig, AxisSegment, NodeConfig, Ratios, RectSegment, RectSegmentConfig,
    Segment, SegmentConfig, Validated,
};
pub use space::{Linear, Planar, Size, Space};
pub use tree::{NodeId, SegmentTree, TreeError};

use serde::{Deserialize, Serialize};

/// One-dimensional segment tree (distance/offset).
pub type LinearTree = SegmentTree<Linear>;

/// Two-dimensional segment tree (width/height with row/column flow).
pub type RectTree = SegmentTree<Planar>;

/// A requested size along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Length {
    /// An exact size.
    Fixed(f32),
    /// A percentage (0.0 to 100.0) of the parent's resolved size on this axis.
    Percent(f32),
    /// Whatever the children need.
    #[default]
    Auto,
}

impl Length {
    /// Resolve to a scalar.
    ///
    /// `reference` backs [`Length::Percent`]; `auto` is the accumulated
    /// children size used by [`Length::Auto`].
    #[inline]
    pub fn resolve(self, reference: f32, auto: f32) -> f32 {
        match self {
            Self::Fixed(value) => value,
            Self::Percent(percent) => reference * percent / 100.0,
            Self::Auto => auto,
        }
    }

    /// Whether resolution depends on the parent size.
    #[inline]
    pub const fn is_percent(self) -> bool {
        matches!(self, Self::Percent(_))
    }
}

impl From<f32> for Length {
    fn from(value: f32) -> Self {
        Self::Fixed(value)
    }
}

/// The direction a node lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Flow {
    /// Left to right: width is the main axis.
    #[default]
    Row,
    /// Top to bottom: height is the main axis.
    Column,
}

impl Flow {
    /// Axis along which children are stacked.
    #[inline]
    pub const fn main_axis(self) -> Axis {
        match self {
            Self::Row => Axis::Horizontal,
            Self::Column => Axis::Vertical,
        }
    }

    /// Axis along which children share the parent's extent.
    #[inline]
    pub const fn cross_axis(self) -> Axis {
        match self {
            Self::Row => Axis::Vertical,
            Self::Column => Axis::Horizontal,
        }
    }
}

/// A layout axis. One-dimensional trees only use [`Axis::Horizontal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Width / distance.
    Horizontal,
    /// Height.
    Vertical,
}

impl Axis {
    /// Storage slot for per-axis arrays.
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
        }
    }
}

/// Size a flat list of segments against `distance` and place them.
///
/// The configs become children of an implicit `Auto` root. Segments come
/// back in input order.
pub fn distribute(
    configs: impl IntoIterator<Item = SegmentConfig>,
    distance: f32,
    options: SizingOptions,
) -> Vec<Segment> {
    let mut tree = LinearTree::new();
    let root = tree.create(SegmentConfig::new("", Length::Auto));
    let ids: Vec<NodeId> = configs
        .into_iter()
        .map(|config| {
            let id = tree.create(config);
            // Fresh handles under a fresh root cannot be stale or cyclic.
            let _ = tree.link(root, id);
            id
        })
        .collect();

    let _ = tree.sizing(root, distance, options);
    let _ = tree.placing(root);
    ids.into_iter().filter_map(|id| tree.segment(id)).collect()
}
