//! Axis parameterization of the engine.
//!
//! The aggregator, planner, cascade and placer are written once against
//! per-axis arrays. A [`Space`] decides which axes are live for a given
//! [`Flow`] and how configs, extents and outputs map onto them:
//!
//! | Space      | Main axis        | Cross axis          | Extent  |
//! |------------|------------------|---------------------|---------|
//! | [`Linear`] | Horizontal       | none                | `f32`   |
//! | [`Planar`] | `flow.main_axis` | `flow.cross_axis`   | [`Size`] |

use crate::segment::{
    AxisSegment, NodeConfig, RectSegment, RectSegmentConfig, Segment, SegmentConfig,
};
use crate::{Axis, Flow};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Dimensionality of a segment tree.
pub trait Space: 'static {
    /// User-facing node configuration.
    type Config: Into<NodeConfig> + Clone + fmt::Debug;
    /// Target handed to [`SegmentTree::sizing`](crate::SegmentTree::sizing).
    type Extent: Copy + fmt::Debug;
    /// User-facing computed output.
    type Segment: Clone + fmt::Debug + PartialEq;

    /// Map a config into the stored form, fixing anything the space forbids.
    fn node_config(config: Self::Config) -> NodeConfig;

    /// Extent per axis, indexed by [`Axis::index`].
    fn extent_axes(extent: Self::Extent) -> [f32; 2];

    /// Cross axis for a node with `flow`, if the space has one.
    fn cross_axis(flow: Flow) -> Option<Axis>;

    /// Build the output view of a node.
    fn segment(config: &NodeConfig, order: u32, axes: &[AxisSegment; 2]) -> Self::Segment;

    /// Main and (optional) cross axis for a node with `flow`.
    #[inline]
    fn axes(flow: Flow) -> (Axis, Option<Axis>) {
        (flow.main_axis(), Self::cross_axis(flow))
    }
}

/// One axis: distance and offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Linear;

impl Space for Linear {
    type Config = SegmentConfig;
    type Extent = f32;
    type Segment = Segment;

    fn node_config(config: SegmentConfig) -> NodeConfig {
        NodeConfig::from(config)
    }

    fn extent_axes(extent: f32) -> [f32; 2] {
        [extent, 0.0]
    }

    fn cross_axis(_flow: Flow) -> Option<Axis> {
        None
    }

    fn segment(config: &NodeConfig, order: u32, axes: &[AxisSegment; 2]) -> Segment {
        let main = axes[Axis::Horizontal.index()];
        Segment {
            name: config.name.clone(),
            base: main.base,
            expand_delta: main.expand_delta,
            distance: main.size,
            offset: main.position,
            order,
        }
    }
}

/// Two axes: width and height, stacked along each node's flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Planar;

impl Space for Planar {
    type Config = RectSegmentConfig;
    type Extent = Size;
    type Segment = RectSegment;

    fn node_config(config: RectSegmentConfig) -> NodeConfig {
        NodeConfig::from(config)
    }

    fn extent_axes(extent: Size) -> [f32; 2] {
        [extent.width, extent.height]
    }

    fn cross_axis(flow: Flow) -> Option<Axis> {
        Some(flow.cross_axis())
    }

    fn segment(config: &NodeConfig, order: u32, axes: &[AxisSegment; 2]) -> RectSegment {
        let horizontal = axes[Axis::Horizontal.index()];
        let vertical = axes[Axis::Vertical.index()];
        RectSegment {
            name: config.name.clone(),
            width: horizontal.size,
            height: vertical.size,
            x: horizontal.position,
            y: vertical.position,
            order,
            flow: config.flow,
        }
    }
}
