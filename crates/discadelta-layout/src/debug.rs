#![forbid(unsafe_code)]

//! Cascade recording for introspection.
//!
//! A [`CascadeRecorder`] attached with
//! [`SegmentTree::set_recorder`](crate::SegmentTree::set_recorder) receives one
//! [`CascadeRecord`] per node with children every time `sizing` runs. The
//! recorder is shared (`Arc`), so a tool thread can read what the owning
//! thread produced.
//!
//! Recording is a no-op until enabled at runtime.
//!
//! # Usage
//!
//! ```
//! use discadelta_layout::debug::CascadeRecorder;
//! use discadelta_layout::{CascadeMode, LinearTree, SegmentConfig, SizingOptions};
//!
//! let recorder = CascadeRecorder::new();
//! recorder.set_enabled(true);
//!
//! let mut tree = LinearTree::new();
//! tree.set_recorder(Some(recorder.clone()));
//! let root = tree.create(SegmentConfig::new("root", 0.0));
//! let child = tree.create(SegmentConfig::new("child", 300.0).bounds(250.0, 400.0));
//! tree.link(root, child).unwrap();
//! tree.sizing(root, 200.0, SizingOptions::default()).unwrap();
//!
//! // The root is raised to its child's floor, then compresses the child.
//! let records = recorder.snapshot();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].mode, CascadeMode::Compress);
//! assert_eq!(records[0].input, 250.0);
//! assert_eq!(records[0].child_sizes, vec![250.0]);
//! ```

use crate::cascade::CascadeMode;
use std::fmt::Write as _;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// One node's cascade decision.
#[derive(Debug, Clone, PartialEq)]
pub struct CascadeRecord {
    /// Node name.
    pub name: String,
    pub mode: CascadeMode,
    /// The node's main-axis size handed to its children.
    pub input: f32,
    pub accumulated_base: f32,
    pub accumulated_min: f32,
    /// Children's final main-axis sizes in link order.
    pub child_sizes: Vec<f32>,
    /// Distance from the sized root.
    pub depth: usize,
}

impl CascadeRecord {
    /// Create an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: CascadeMode::default(),
            input: 0.0,
            accumulated_base: 0.0,
            accumulated_min: 0.0,
            child_sizes: Vec::new(),
            depth: 0,
        }
    }

    /// Sum of the children's sizes.
    pub fn total(&self) -> f32 {
        self.child_sizes.iter().sum()
    }

    /// Children take more than the input (their mins do not fit).
    pub fn has_underflow(&self) -> bool {
        self.total() > self.input + tolerance(self.input)
    }

    /// Children leave part of the input unused.
    pub fn has_slack(&self) -> bool {
        self.total() < self.input - tolerance(self.input)
    }

    /// Percentage of the input the children use.
    pub fn utilization(&self) -> f32 {
        if self.input <= 0.0 {
            return 0.0;
        }
        (self.total() / self.input * 100.0).min(100.0)
    }

    /// Generate a human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let indent = "  ".repeat(self.depth);
        let _ = writeln!(s, "{indent}{} ({:?}):", self.name, self.mode);
        let _ = writeln!(
            s,
            "{indent}  Input: {:.2} (accumulated base {:.2}, min {:.2})",
            self.input, self.accumulated_base, self.accumulated_min
        );
        for (i, size) in self.child_sizes.iter().enumerate() {
            let _ = writeln!(s, "{indent}  [{i}] -> {size:.2}");
        }
        let _ = writeln!(s, "{indent}  Utilization: {:.1}%", self.utilization());
        if self.has_underflow() {
            let _ = writeln!(s, "{indent}  UNDERFLOW");
        }
        if self.has_slack() {
            let _ = writeln!(s, "{indent}  UNFILLED");
        }
        s
    }
}

fn tolerance(input: f32) -> f32 {
    1e-4 * input.abs().max(1.0)
}

/// Thread-safe collector of [`CascadeRecord`]s.
#[derive(Debug)]
pub struct CascadeRecorder {
    enabled: AtomicBool,
    records: Mutex<Vec<CascadeRecord>>,
}

impl CascadeRecorder {
    /// Create a recorder wrapped in `Arc` (disabled by default).
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            enabled: AtomicBool::new(false),
            records: Mutex::new(Vec::new()),
        })
    }

    /// Check if recording is enabled.
    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Enable or disable recording.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Toggle recording; returns the new state.
    pub fn toggle(&self) -> bool {
        !self.enabled.fetch_xor(true, Ordering::Relaxed)
    }

    /// Drop all records.
    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    /// Store a record if enabled.
    pub fn record(&self, record: CascadeRecord) {
        if !self.enabled() {
            return;
        }
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// Copy of all records, in the order nodes finished.
    pub fn snapshot(&self) -> Vec<CascadeRecord> {
        self.records
            .lock()
            .ok()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Records whose children did not fit.
    pub fn underflows(&self) -> Vec<CascadeRecord> {
        self.snapshot()
            .into_iter()
            .filter(CascadeRecord::has_underflow)
            .collect()
    }

    /// Summary report of everything recorded.
    pub fn report(&self) -> String {
        let records = self.snapshot();
        let mut s = String::new();
        let _ = writeln!(s, "=== Cascade Report ({} nodes) ===", records.len());

        let underflows: Vec<_> = records.iter().filter(|r| r.has_underflow()).collect();
        if !underflows.is_empty() {
            let _ = writeln!(s, "\n{} nodes UNDERFLOW:", underflows.len());
            for r in &underflows {
                let _ = writeln!(s, "  - {} ({:.2} > {:.2})", r.name, r.total(), r.input);
            }
        }

        for record in &records {
            let _ = write!(s, "\n{}", record.summary());
        }
        s
    }
}
