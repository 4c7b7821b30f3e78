//! Segment configuration, computed output, and the metrics validator.
//!
//! Everything here is plain data plus pure functions. The validator turns a
//! node's configuration and its children's accumulated metrics into clamped
//! scalars that satisfy `0 <= min <= base <= max`; out-of-range input is
//! absorbed, never reported.

use crate::{Axis, Flow, Length, Rect};
use serde::{Deserialize, Serialize};

// ============================================================================
// Configuration
// ============================================================================

/// Configuration of a one-dimensional segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Identity key, used by name lookups.
    pub name: String,
    /// Nominal size before elastic adjustment.
    pub base: Length,
    /// Fraction of the base that may be given up under compression (0.0 to 1.0).
    pub compress_ratio: f32,
    /// Share weight of spare space under expansion.
    pub expand_ratio: f32,
    /// Hard lower bound.
    pub min: f32,
    /// Hard upper bound.
    pub max: f32,
    /// Placement sequence among siblings.
    pub order: u32,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            base: Length::Auto,
            compress_ratio: 1.0,
            expand_ratio: 1.0,
            min: 0.0,
            max: f32::MAX,
            order: 0,
        }
    }
}

impl SegmentConfig {
    /// Create a segment with a base and default elasticity.
    pub fn new(name: impl Into<String>, base: impl Into<Length>) -> Self {
        Self {
            name: name.into(),
            base: base.into(),
            ..Default::default()
        }
    }

    /// Set the compress ratio.
    pub fn compress(mut self, ratio: f32) -> Self {
        self.compress_ratio = ratio;
        self
    }

    /// Set the expand ratio.
    pub fn expand(mut self, ratio: f32) -> Self {
        self.expand_ratio = ratio;
        self
    }

    /// Set the min/max bounds.
    pub fn bounds(mut self, min: f32, max: f32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the placement order.
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

/// Configuration of a two-dimensional segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectSegmentConfig {
    pub name: String,
    pub width: Length,
    pub width_min: f32,
    pub width_max: f32,
    pub height: Length,
    pub height_min: f32,
    pub height_max: f32,
    /// Which axis this node's children are stacked along.
    pub flow: Flow,
    pub compress_ratio: f32,
    pub expand_ratio: f32,
    pub order: u32,
}

impl Default for RectSegmentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            width: Length::Auto,
            width_min: 0.0,
            width_max: f32::MAX,
            height: Length::Auto,
            height_min: 0.0,
            height_max: f32::MAX,
            flow: Flow::Row,
            compress_ratio: 1.0,
            expand_ratio: 1.0,
            order: 0,
        }
    }
}

impl RectSegmentConfig {
    /// Create a rect segment with `Auto` width and height.
    pub fn new(name: impl Into<String>, flow: Flow) -> Self {
        Self {
            name: name.into(),
            flow,
            ..Default::default()
        }
    }

    /// Set the width length.
    pub fn width(mut self, width: impl Into<Length>) -> Self {
        self.width = width.into();
        self
    }

    /// Set the height length.
    pub fn height(mut self, height: impl Into<Length>) -> Self {
        self.height = height.into();
        self
    }

    /// Set the width bounds.
    pub fn width_bounds(mut self, min: f32, max: f32) -> Self {
        self.width_min = min;
        self.width_max = max;
        self
    }

    /// Set the height bounds.
    pub fn height_bounds(mut self, min: f32, max: f32) -> Self {
        self.height_min = min;
        self.height_max = max;
        self
    }

    /// Set the compress ratio.
    pub fn compress(mut self, ratio: f32) -> Self {
        self.compress_ratio = ratio;
        self
    }

    /// Set the expand ratio.
    pub fn expand(mut self, ratio: f32) -> Self {
        self.expand_ratio = ratio;
        self
    }

    /// Set the placement order.
    pub fn order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }
}

/// Requested size and bounds along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub size: Length,
    pub min: f32,
    pub max: f32,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            size: Length::Auto,
            min: 0.0,
            max: f32::MAX,
        }
    }
}

/// Dimension-independent node configuration stored in the tree.
///
/// Both [`SegmentConfig`] and [`RectSegmentConfig`] convert into this; a
/// one-dimensional node only uses the [`Axis::Horizontal`] slot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    pub name: String,
    /// Indexed by [`Axis::index`].
    pub axes: [AxisConfig; 2],
    pub flow: Flow,
    pub compress_ratio: f32,
    pub expand_ratio: f32,
    pub order: u32,
}

impl NodeConfig {
    /// Config along one axis.
    #[inline]
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        &self.axes[axis.index()]
    }

    /// Whether any axis resolves against the parent size.
    pub fn has_percent(&self) -> bool {
        self.axes.iter().any(|axis| axis.size.is_percent())
    }
}

impl From<SegmentConfig> for NodeConfig {
    fn from(config: SegmentConfig) -> Self {
        Self {
            name: config.name,
            axes: [
                AxisConfig {
                    size: config.base,
                    min: config.min,
                    max: config.max,
                },
                AxisConfig::default(),
            ],
            flow: Flow::Row,
            compress_ratio: config.compress_ratio,
            expand_ratio: config.expand_ratio,
            order: config.order,
        }
    }
}

impl From<RectSegmentConfig> for NodeConfig {
    fn from(config: RectSegmentConfig) -> Self {
        Self {
            name: config.name,
            axes: [
                AxisConfig {
                    size: config.width,
                    min: config.width_min,
                    max: config.width_max,
                },
                AxisConfig {
                    size: config.height,
                    min: config.height_min,
                    max: config.height_max,
                },
            ],
            flow: config.flow,
            compress_ratio: config.compress_ratio,
            expand_ratio: config.expand_ratio,
            order: config.order,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Sizing and placement output along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisSegment {
    /// Size before elastic growth (the compressed size under compression).
    pub base: f32,
    /// Elastic growth added to `base`.
    pub expand_delta: f32,
    /// Final size, `base + expand_delta`.
    pub size: f32,
    /// Offset from the tree origin.
    pub position: f32,
}

/// Computed state of a one-dimensional segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub base: f32,
    pub expand_delta: f32,
    pub distance: f32,
    pub offset: f32,
    pub order: u32,
}

/// Computed state of a two-dimensional segment.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RectSegment {
    pub name: String,
    pub width: f32,
    pub height: f32,
    pub x: f32,
    pub y: f32,
    pub order: u32,
    pub flow: Flow,
}

impl RectSegment {
    /// Floor into an integer rectangle for a graphics API.
    pub fn to_rect(&self) -> Rect {
        Rect::from_f32(self.x, self.y, self.width, self.height)
    }
}

impl From<&RectSegment> for Rect {
    fn from(segment: &RectSegment) -> Self {
        segment.to_rect()
    }
}

// ============================================================================
// Metrics Validator
// ============================================================================

/// A node's own clamped metrics along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Validated {
    pub min: f32,
    pub max: f32,
    pub base: f32,
    /// Part of `base` that can be proportionally compressed.
    pub compress_capacity: f32,
    /// Part of `base` below which proportional compression stops.
    pub compress_solidify: f32,
}

/// Fold of a node's children along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accumulated {
    pub base: f32,
    pub min: f32,
    pub compress_solidify: f32,
    pub expand_ratio: f32,
}

/// Clamped elastic ratios.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ratios {
    pub compress: f32,
    pub expand: f32,
}

/// Clamp the configured ratios: compress into `[0, 1]`, expand to `>= 0`.
///
/// NaN becomes zero.
pub fn validate_ratios(compress: f32, expand: f32) -> Ratios {
    Ratios {
        compress: compress.max(0.0).min(1.0),
        expand: expand.max(0.0),
    }
}

/// Validate one axis of a node.
///
/// `basis` is the parent size used for [`Length::Percent`]; `Auto` resolves to
/// the accumulated children base.
pub fn validate_axis(
    config: &AxisConfig,
    accumulated: &Accumulated,
    basis: f32,
    compress_ratio: f32,
) -> Validated {
    let min = 0.0_f32.max(config.min).max(accumulated.min);
    let max = min.max(config.max);
    let base = config
        .size
        .resolve(basis, accumulated.base)
        .max(min)
        .min(max);
    let compress_capacity = base * compress_ratio;

    Validated {
        min,
        max,
        base,
        compress_capacity,
        compress_solidify: (base - compress_capacity).max(0.0),
    }
}
