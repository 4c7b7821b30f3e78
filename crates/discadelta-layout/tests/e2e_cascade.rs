//! E2E scenarios for the compress/expand cascade.
//!
//! Every test emits structured JSONL records for post-hoc analysis.
//!
//! Run with: `cargo test -p discadelta-layout --test e2e_cascade -- --nocapture`
//!
//! JSONL schema per record:
//! ```json
//! { "test": "<name>", "phase": "<setup|execute|verify>",
//!   ...<phase-specific fields> }
//! ```

use discadelta_layout::debug::CascadeRecorder;
use discadelta_layout::{
    Axis, CascadeMode, Flow, Length, LinearTree, NodeId, Rect, RectSegmentConfig, RectTree,
    SegmentConfig, Size, SizingOptions, distribute,
};
use serde_json::json;
use std::io::Write as _;
use std::sync::Mutex;

// ============================================================================
// JSONL logging infrastructure
// ============================================================================

/// Thread-safe JSONL log buffer. Flushed to stderr at test end for capture.
struct JsonlLog {
    entries: Mutex<Vec<serde_json::Value>>,
}

impl JsonlLog {
    fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    fn emit(&self, entry: serde_json::Value) {
        self.entries.lock().unwrap().push(entry);
    }

    fn flush(&self, test_name: &str) {
        let entries = self.entries.lock().unwrap();
        let mut stderr = std::io::stderr().lock();
        for entry in entries.iter() {
            let _ = writeln!(stderr, "[JSONL] {test_name}: {entry}");
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

const EPS: f32 = 1e-3;

fn reference_configs() -> Vec<SegmentConfig> {
    vec![
        SegmentConfig::new("1", 200.0).compress(0.7).expand(0.1).bounds(0.0, 100.0),
        SegmentConfig::new("2", 200.0).compress(1.0).expand(1.0).bounds(300.0, 800.0),
        SegmentConfig::new("3", 150.0).compress(0.0).expand(2.0).bounds(0.0, 200.0),
        SegmentConfig::new("4", 350.0).compress(0.3).expand(0.5).bounds(50.0, 300.0),
    ]
}

fn reference_tree() -> (LinearTree, NodeId, Vec<NodeId>) {
    let mut tree = LinearTree::new();
    let root = tree.create(SegmentConfig::new("root", Length::Auto));
    let ids = reference_configs()
        .into_iter()
        .map(|config| {
            let id = tree.create(config);
            tree.link(root, id).unwrap();
            id
        })
        .collect();
    (tree, root, ids)
}

fn segment_json(tree: &LinearTree, ids: &[NodeId]) -> Vec<serde_json::Value> {
    ids.iter()
        .filter_map(|&id| tree.segment(id))
        .map(|s| serde_json::to_value(&s).unwrap())
        .collect()
}

fn assert_in_bounds(tree: &LinearTree, ids: &[NodeId]) {
    for &id in ids {
        let v = tree.validated(id, Axis::Horizontal).unwrap();
        let d = tree.segment(id).unwrap().distance;
        assert!(
            d >= v.min - EPS && d <= v.max + EPS,
            "{:?}: {d} outside [{}, {}]",
            tree.name(id),
            v.min,
            v.max
        );
    }
}

// ============================================================================
// Reference scenarios
// ============================================================================

#[test]
fn compression_scenario() {
    let log = JsonlLog::new();
    let (mut tree, root, ids) = reference_tree();
    let acc = tree.accumulated(root, Axis::Horizontal).unwrap();
    log.emit(json!({
        "test": "compression_scenario", "phase": "setup",
        "accumulated_base": acc.base, "accumulated_min": acc.min,
    }));

    let report = tree.sizing(root, 800.0, SizingOptions::default()).unwrap();
    tree.placing(root).unwrap();
    log.emit(json!({
        "test": "compression_scenario", "phase": "execute",
        "report": serde_json::to_value(report).unwrap(),
        "segments": segment_json(&tree, &ids),
    }));

    assert_eq!(report.mode, CascadeMode::Compress);
    assert!(!report.underflow);
    assert_in_bounds(&tree, &ids);
    let total: f32 = ids.iter().map(|&id| tree.segment(id).unwrap().distance).sum();
    assert!((total - 800.0).abs() < EPS);
    assert!(total >= 650.0);

    log.emit(json!({"test": "compression_scenario", "phase": "verify", "total": total}));
    log.flush("compression_scenario");
}

#[test]
fn expansion_scenario() {
    let log = JsonlLog::new();
    let (mut tree, root, ids) = reference_tree();

    let report = tree.sizing(root, 900.0, SizingOptions::default()).unwrap();
    tree.placing(root).unwrap();
    log.emit(json!({
        "test": "expansion_scenario", "phase": "execute",
        "report": serde_json::to_value(report).unwrap(),
        "segments": segment_json(&tree, &ids),
    }));

    assert_eq!(report.mode, CascadeMode::Expand);
    assert!(!report.unfilled);
    assert_in_bounds(&tree, &ids);
    let mut total = 0.0;
    for &id in &ids {
        let segment = tree.segment(id).unwrap();
        let v = tree.validated(id, Axis::Horizontal).unwrap();
        assert!(segment.expand_delta <= v.max - v.base + EPS);
        total += segment.distance;
    }
    assert!((total - 900.0).abs() < EPS);
    log.flush("expansion_scenario");
}

#[test]
fn reorder_scenario() {
    let log = JsonlLog::new();
    let (mut tree, root, ids) = reference_tree();
    tree.sizing(root, 800.0, SizingOptions::default()).unwrap();
    tree.placing(root).unwrap();
    let before: Vec<_> = ids.iter().map(|&id| tree.segment(id).unwrap()).collect();

    assert!(tree.set_order(root, "1", 3));
    assert!(tree.set_order(root, "3", 2));
    tree.placing(root).unwrap();
    let after: Vec<_> = ids.iter().map(|&id| tree.segment(id).unwrap()).collect();
    log.emit(json!({
        "test": "reorder_scenario", "phase": "verify",
        "before": serde_json::to_value(&before).unwrap(),
        "after": serde_json::to_value(&after).unwrap(),
    }));

    for (b, a) in before.iter().zip(&after) {
        assert_eq!(b.distance.to_bits(), a.distance.to_bits());
        assert_eq!(b.base.to_bits(), a.base.to_bits());
    }
    assert_ne!(
        before.iter().map(|s| s.offset).collect::<Vec<_>>(),
        after.iter().map(|s| s.offset).collect::<Vec<_>>()
    );
    // Placement sequence is now 2 (order 0), 4 (order 0), 3 (order 2), 1 (order 3).
    assert_eq!(after[1].offset, 0.0);
    assert!((after[3].offset - after[1].distance).abs() < EPS);
    assert!((after[2].offset - (after[1].distance + after[3].distance)).abs() < EPS);
    log.flush("reorder_scenario");
}

// ============================================================================
// Two-dimensional layout
// ============================================================================

#[test]
fn rect_dashboard_layout() {
    let log = JsonlLog::new();
    let mut tree = RectTree::new();
    let root = tree.create(RectSegmentConfig::new("root", Flow::Column));
    let header = tree.create(
        RectSegmentConfig::new("header", Flow::Row)
            .height(40.0)
            .compress(0.0)
            .expand(0.0),
    );
    let body = tree.create(RectSegmentConfig::new("body", Flow::Row).height(200.0));
    let sidebar = tree.create(
        RectSegmentConfig::new("sidebar", Flow::Column)
            .width(Length::Percent(25.0))
            .expand(0.0),
    );
    let content = tree.create(RectSegmentConfig::new("content", Flow::Column).width(300.0));
    tree.link(root, header).unwrap();
    tree.link(root, body).unwrap();
    tree.link(body, sidebar).unwrap();
    tree.link(body, content).unwrap();

    let report = tree
        .sizing(root, Size::new(800.0, 600.0), SizingOptions::default())
        .unwrap();
    tree.placing(root).unwrap();

    let rects: Vec<(String, Rect)> = [header, body, sidebar, content]
        .into_iter()
        .map(|id| {
            let segment = tree.segment(id).unwrap();
            (segment.name.clone(), segment.to_rect())
        })
        .collect();
    log.emit(json!({
        "test": "rect_dashboard_layout", "phase": "execute",
        "report": serde_json::to_value(report).unwrap(),
        "rects": rects.iter().map(|(n, r)| json!({
            "name": n, "x": r.x, "y": r.y, "w": r.width, "h": r.height,
        })).collect::<Vec<_>>(),
    }));

    assert_eq!(rects[0].1, Rect::new(0, 0, 800, 40));
    assert_eq!(rects[1].1, Rect::new(0, 40, 800, 560));
    // The sidebar resolves a quarter of the body's width.
    assert_eq!(rects[2].1, Rect::new(0, 40, 200, 560));
    assert_eq!(rects[3].1, Rect::new(200, 40, 600, 560));
    log.flush("rect_dashboard_layout");
}

#[test]
fn rect_rounded_split() {
    let mut tree = RectTree::new();
    let root = tree.create(RectSegmentConfig::new("root", Flow::Row));
    let ids: Vec<_> = (0..3)
        .map(|i| {
            let id = tree.create(RectSegmentConfig::new(format!("c{i}"), Flow::Row).width(0.0));
            tree.link(root, id).unwrap();
            id
        })
        .collect();
    tree.sizing(root, Size::new(100.0, 10.0), SizingOptions::rounded())
        .unwrap();
    tree.placing(root).unwrap();

    let widths: Vec<f32> = ids.iter().map(|&id| tree.segment(id).unwrap().width).collect();
    assert!(widths.iter().all(|w| w.fract() == 0.0));
    let total: f32 = widths.iter().sum();
    assert!((total - 100.0).abs() <= ids.len() as f32);
}

// ============================================================================
// Recorder, serde, determinism
// ============================================================================

#[test]
fn recorder_captures_nested_cascades() {
    let recorder = CascadeRecorder::new();
    recorder.set_enabled(true);

    let mut tree = LinearTree::new();
    tree.set_recorder(Some(recorder.clone()));
    let root = tree.create(SegmentConfig::new("root", Length::Auto));
    let group = tree.create(SegmentConfig::new("group", Length::Auto));
    let leaf = tree.create(SegmentConfig::new("leaf", 50.0));
    let other = tree.create(SegmentConfig::new("other", 50.0));
    tree.link(group, leaf).unwrap();
    tree.link(root, group).unwrap();
    tree.link(root, other).unwrap();

    tree.sizing(root, 60.0, SizingOptions::default()).unwrap();
    let records = recorder.snapshot();
    // Children finish before their parent.
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["group", "root"]);
    assert_eq!(records[0].depth, 1);
    assert!(records.iter().all(|r| r.mode == CascadeMode::Compress));
    assert!(recorder.underflows().is_empty());
    assert!(recorder.report().contains("root (Compress)"));

    recorder.set_enabled(false);
    tree.sizing(root, 90.0, SizingOptions::default()).unwrap();
    assert_eq!(recorder.snapshot().len(), 2);
}

#[test]
fn configs_load_from_json() {
    let raw = r#"[
        {"name": "nav", "base": {"Fixed": 120.0}, "compress_ratio": 0.0, "expand_ratio": 0.0},
        {"name": "main", "base": {"Fixed": 400.0}, "min": 200.0},
        {"name": "aside", "base": {"Percent": 20.0}, "expand_ratio": 0.0, "order": 2}
    ]"#;
    let configs: Vec<SegmentConfig> = serde_json::from_str(raw).unwrap();
    assert_eq!(configs[1].max, f32::MAX);
    assert_eq!(configs[2].base, Length::Percent(20.0));

    let segments = distribute(configs, 1000.0, SizingOptions::default());
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0].distance, 120.0);
    assert_eq!(segments[2].distance, 200.0);
    assert!((segments[1].distance - 680.0).abs() < EPS);
    assert_eq!(segments[2].offset, 800.0);
}

fn digest(tree: &LinearTree, ids: &[NodeId]) -> String {
    let mut bytes = Vec::new();
    for &id in ids {
        let segment = tree.segment(id).unwrap();
        for value in [segment.base, segment.expand_delta, segment.distance, segment.offset] {
            bytes.extend_from_slice(&value.to_bits().to_le_bytes());
        }
    }
    format!("blake3:{}", blake3::hash(&bytes).to_hex())
}

#[test]
fn identical_builds_are_bit_identical() {
    let run = |distance: f32, round: bool| {
        let (mut tree, root, ids) = reference_tree();
        tree.sizing(root, distance, SizingOptions::new().round(round))
            .unwrap();
        tree.placing(root).unwrap();
        digest(&tree, &ids)
    };
    for distance in [400.0, 800.0, 850.0, 900.0, 1_500.0] {
        for round in [false, true] {
            assert_eq!(run(distance, round), run(distance, round));
        }
    }
    assert_ne!(run(800.0, false), run(900.0, false));
}

#[test]
fn resizing_is_repeatable() {
    let (mut tree, root, ids) = reference_tree();
    tree.sizing(root, 800.0, SizingOptions::default()).unwrap();
    tree.placing(root).unwrap();
    let first = digest(&tree, &ids);

    tree.sizing(root, 900.0, SizingOptions::default()).unwrap();
    tree.sizing(root, 800.0, SizingOptions::default()).unwrap();
    tree.placing(root).unwrap();
    assert_eq!(digest(&tree, &ids), first);
}
