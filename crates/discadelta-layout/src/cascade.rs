#![forbid(unsafe_code)]

//! Compress/expand cascade.
//!
//! `sizing` resolves a target extent at a root and pushes it down the tree.
//! At each node the children's accumulated base decides the mode:
//!
//! - **Compress** (`input < accumulated.base`): every child gives up a share
//!   of its compressible capacity proportional to what the remaining pool
//!   still has to lose. A child never goes below its own `min`; if the mins
//!   alone exceed the input the node underflows.
//! - **Expand** (otherwise): the spare space is split across children by
//!   expand ratio, each grant capped at the child's `max`.
//!
//! Children are visited in the priority order the planner built (least slack
//! first), so a single forward pass lands on the same result as iterating
//! the proportional split to a fixed point.
//!
//! # Rounding
//!
//! [`SizingOptions::round`] snaps the accumulated base the mode is decided
//! against and every final size to whole units. Sibling sums then drift by
//! at most one unit per child.

use crate::aggregate::{Fold, fold};
use crate::debug::CascadeRecord;
use crate::priority::priorities;
use crate::segment::{Accumulated, Ratios, Validated, validate_axis};
use crate::space::Space;
use crate::tree::{NodeId, SegmentTree, TreeError};
use crate::{Axis, Length};
use serde::{Deserialize, Serialize};

/// Relative tolerance for unrounded sibling sums.
const SUM_EPSILON: f32 = 1e-4;

// ============================================================================
// Options and Report
// ============================================================================

/// Options for [`SegmentTree::sizing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizingOptions {
    /// Snap accumulated bases and final sizes to whole units.
    pub round: bool,
}

impl SizingOptions {
    /// Environment variable read by [`SizingOptions::from_env`].
    pub const ROUND_ENV: &'static str = "DISCADELTA_ROUND";

    /// Unrounded sizing.
    #[must_use]
    pub const fn new() -> Self {
        Self { round: false }
    }

    /// Rounded sizing.
    #[must_use]
    pub const fn rounded() -> Self {
        Self { round: true }
    }

    /// Set rounding.
    #[must_use]
    pub const fn round(mut self, round: bool) -> Self {
        self.round = round;
        self
    }

    /// Options from the environment.
    ///
    /// Set `DISCADELTA_ROUND=1` (or `true`/`yes`) to round.
    #[must_use]
    pub fn from_env() -> Self {
        let round = std::env::var(Self::ROUND_ENV)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        Self { round }
    }

    #[inline]
    pub(crate) fn snap(self, value: f32) -> f32 {
        if self.round { value.round() } else { value }
    }

    /// Snap `value` raised to `floor`, rounding up when rounding to nearest
    /// would land below `floor`.
    #[inline]
    pub(crate) fn snap_floor(self, value: f32, floor: f32) -> f32 {
        let value = value.max(floor);
        let snapped = self.snap(value);
        if snapped < floor { value.ceil() } else { snapped }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

/// Which cascade a node ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CascadeMode {
    /// Input below the children's accumulated base.
    Compress,
    /// Input at or above the children's accumulated base.
    #[default]
    Expand,
}

/// Outcome of a [`SegmentTree::sizing`] call.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizingReport {
    /// Mode of the root's cascade.
    pub mode: CascadeMode,
    /// Resolved main-axis size of the root.
    pub distance: f32,
    /// Nodes visited, root included.
    pub nodes: usize,
    /// The root was raised above the request, or some node's children
    /// needed more than it had.
    pub underflow: bool,
    /// Some expansion could not be placed because every taker hit its `max`.
    pub unfilled: bool,
}

/// Guarded proportional split: `d / a × f`, or 0 if any operand is not
/// positive.
#[inline]
pub fn scale(d: f32, a: f32, f: f32) -> f32 {
    if d <= 0.0 || a <= 0.0 || f <= 0.0 {
        0.0
    } else {
        d / a * f
    }
}

/// Cross-axis size of a child given the parent's cross extent.
///
/// `Fixed` lengths use the validated base; `Auto` takes the full extent and
/// `Percent` a share of it. The result is clamped to
/// `[min, min(max, cross_input)]` with `min` winning.
pub fn cross_size(
    length: Length,
    validated: &Validated,
    cross_input: f32,
    options: SizingOptions,
) -> f32 {
    let preferred = match length {
        Length::Fixed(_) => validated.base,
        other => other.resolve(cross_input, cross_input),
    };
    options.snap_floor(
        preferred.min(validated.max).min(cross_input),
        validated.min,
    )
}

// ============================================================================
// Sizing
// ============================================================================

/// Children's main-axis metrics as one cascade sees them.
struct Distribution {
    accumulated: Accumulated,
    /// Link order.
    children: Vec<(Validated, Ratios)>,
    compress_priority: Vec<usize>,
    expand_priority: Vec<usize>,
}

/// Per-node parameters shared by both cascade modes.
struct Cascade {
    depth: usize,
    main: Axis,
    cross: Option<Axis>,
    input: f32,
    cross_input: Option<f32>,
    options: SizingOptions,
}

impl<S: Space> SegmentTree<S> {
    /// Resolve `extent` at `root` and size the whole subtree.
    ///
    /// The root is never made smaller than its own or its children's
    /// minimum; when that raises the request the report flags underflow.
    ///
    /// # Errors
    ///
    /// [`TreeError::StaleNode`] if `root` is not live.
    pub fn sizing(
        &mut self,
        root: NodeId,
        extent: S::Extent,
        options: SizingOptions,
    ) -> Result<SizingReport, TreeError> {
        self.check(root)?;
        let requested = S::extent_axes(extent);
        let _span = tracing::trace_span!("sizing", node = %root, ?requested, round = options.round)
            .entered();

        let node = self.node(root);
        let (main, cross) = S::axes(node.config.flow);
        let mut report = SizingReport::default();
        let mut output = node.output;
        for axis in std::iter::once(main).chain(cross) {
            let i = axis.index();
            let input = options.snap_floor(
                requested[i],
                node.accumulated[i].min.max(node.validated[i].min),
            );
            output[i].base = input;
            output[i].expand_delta = 0.0;
            output[i].size = input;
        }

        let distance = output[main.index()].size;
        let wanted = requested[main.index()];
        if distance > wanted + SUM_EPSILON * wanted.abs().max(1.0) {
            tracing::debug!(
                node = %root,
                requested = wanted,
                distance,
                "root raised to its minimum"
            );
            report.underflow = true;
        }
        report.distance = distance;
        self.node_mut(root).output = output;

        let mode = self.distribute(root, 0, options, &mut report);
        report.mode = mode;
        Ok(report)
    }

    /// Size the children of a node whose own output is already set.
    fn distribute(
        &mut self,
        id: NodeId,
        depth: usize,
        options: SizingOptions,
        report: &mut SizingReport,
    ) -> CascadeMode {
        report.nodes += 1;
        if self.node(id).children.is_empty() {
            return CascadeMode::default();
        }
        let node = self.node(id);
        let (main, cross) = S::axes(node.config.flow);
        let input = node.output[main.index()].size;
        let cross_input = cross.map(|c| node.output[c.index()].size);
        let plan = self.distribution(id, main);
        let acc = plan.accumulated;

        let mode = if input < options.snap(acc.base) {
            CascadeMode::Compress
        } else {
            CascadeMode::Expand
        };
        let cascade = Cascade {
            depth,
            main,
            cross,
            input,
            cross_input,
            options,
        };
        match mode {
            CascadeMode::Compress => self.compress(id, &plan, &cascade, report),
            CascadeMode::Expand => self.expand(id, &plan, &cascade, report),
        }

        let node = self.node(id);
        let child_sizes: Vec<f32> = node
            .children
            .iter()
            .map(|&c| self.node(c).output[main.index()].size)
            .collect();
        let total: f32 = child_sizes.iter().sum();
        let tolerance = if options.round {
            child_sizes.len() as f32
        } else {
            SUM_EPSILON * input.abs().max(1.0)
        };
        if total > input + tolerance {
            tracing::debug!(node = %id, input, total, "children exceed node size");
            report.underflow = true;
        } else if total < input - tolerance {
            tracing::debug!(node = %id, input, total, "expansion stopped at max bounds");
            report.unfilled = true;
        }

        if let Some(recorder) = self.recorder.as_ref().filter(|r| r.enabled()) {
            recorder.record(CascadeRecord {
                name: node.config.name.clone(),
                mode,
                input,
                accumulated_base: acc.base,
                accumulated_min: acc.min,
                child_sizes,
                depth,
            });
        }
        mode
    }

    /// Main-axis metrics of `id`'s children for this cascade.
    ///
    /// Children with a `Percent` length are resolved against the node's
    /// current size. The cached metrics keep their link-time basis, so
    /// sizing never writes into them.
    fn distribution(&self, id: NodeId, main: Axis) -> Distribution {
        let node = self.node(id);
        let i = main.index();
        let basis = node.output[i].size;
        let mut resized = false;
        let children: Vec<(Validated, Ratios)> = node
            .children
            .iter()
            .map(|&c| {
                let child = self.node(c);
                let config = &child.config.axes[i];
                let validated = if config.size.is_percent() && child.percent_basis[i] != basis {
                    resized = true;
                    validate_axis(config, &child.accumulated[i], basis, child.ratios.compress)
                } else {
                    child.validated[i]
                };
                (validated, child.ratios)
            })
            .collect();

        if !resized {
            return Distribution {
                accumulated: node.accumulated[i],
                compress_priority: node.compress_priority.clone(),
                expand_priority: node.expand_priority.clone(),
                children,
            };
        }
        let accumulated = fold(
            Fold::Sum,
            children.iter().map(|(v, ratios)| (*v, ratios.expand)),
        );
        let (compress_priority, expand_priority) =
            priorities(children.iter().map(|(v, ratios)| (v, ratios)));
        Distribution {
            accumulated,
            compress_priority,
            expand_priority,
            children,
        }
    }

    fn compress(
        &mut self,
        id: NodeId,
        plan: &Distribution,
        cascade: &Cascade,
        report: &mut SizingReport,
    ) {
        let main = cascade.main.index();
        let options = cascade.options;
        let mut pool_dist = cascade.input;
        let mut pool_base = plan.accumulated.base;
        let mut pool_solid = plan.accumulated.compress_solidify;
        for &index in &plan.compress_priority {
            let child = self.node(id).children[index];
            let (v, _) = plan.children[index];
            let share = scale(
                pool_dist - pool_solid,
                pool_base - pool_solid,
                v.compress_capacity,
            ) + v.compress_solidify;
            let size = options.snap_floor(share, v.min);

            let out = &mut self.node_mut(child).output[main];
            out.base = size;
            out.expand_delta = 0.0;
            out.size = size;
            self.apply_cross(child, cascade);
            self.distribute(child, cascade.depth + 1, options, report);

            pool_dist -= size;
            pool_base -= v.base;
            pool_solid -= v.compress_solidify;
        }
    }

    fn expand(
        &mut self,
        id: NodeId,
        plan: &Distribution,
        cascade: &Cascade,
        report: &mut SizingReport,
    ) {
        let main = cascade.main.index();
        let options = cascade.options;
        let mut delta = (cascade.input - options.snap(plan.accumulated.base)).max(0.0);
        let mut pool = plan.accumulated.expand_ratio;
        for &index in &plan.expand_priority {
            let child = self.node(id).children[index];
            let (v, ratios) = plan.children[index];
            let grant = if delta > 0.0 {
                scale(delta, pool, ratios.expand).min((v.max - v.base).max(0.0))
            } else {
                0.0
            };
            let base = options.snap_floor(v.base, v.min);
            let size = options.snap_floor(v.base + grant, base);

            let out = &mut self.node_mut(child).output[main];
            out.base = base;
            out.expand_delta = size - base;
            out.size = size;
            self.apply_cross(child, cascade);
            self.distribute(child, cascade.depth + 1, options, report);

            delta -= grant;
            pool -= ratios.expand;
        }
    }

    fn apply_cross(&mut self, child: NodeId, cascade: &Cascade) {
        let (Some(axis), Some(cross_input)) = (cascade.cross, cascade.cross_input) else {
            return;
        };
        let node = self.node_mut(child);
        let i = axis.index();
        let size = cross_size(
            node.config.axes[i].size,
            &node.validated[i],
            cross_input,
            cascade.options,
        );
        node.output[i].base = size;
        node.output[i].expand_delta = 0.0;
        node.output[i].size = size;
    }
}

// ============================================================================
// Tests
// ============================================================================
