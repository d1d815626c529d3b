//! End-to-end fixture tests for poseval.
//!
//! Each fixture under `testdata/fixtures/<name>/` holds `groundtruth/` and
//! `predictions/` directories in PoseTrack `annolist` format plus an
//! `expected.json` with hand-computed metrics.
//!
//! Run with: cargo test fixture

use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

use poseval_rs::frame_store::load_directories;
use poseval_rs::metrics::{APTable, MOTTable};
use poseval_rs::{EvalConfig, Evaluator, Joint, METRIC_CONVENTION};

const TOLERANCE: f64 = 1e-9;

// ============================================================================
// Fixture JSON Schema
// ============================================================================

#[derive(Debug, Deserialize)]
struct Expected {
    #[allow(dead_code)]
    description: String,
    excluded: Vec<String>,
    ap: Vec<APRowJson>,
    mot: Vec<MOTRowJson>,
    counts: Vec<CountsJson>,
}

#[derive(Debug, Deserialize)]
struct APRowJson {
    name: String,
    ap: f64,
    precision: f64,
    recall: f64,
}

#[derive(Debug, Deserialize)]
struct MOTRowJson {
    name: String,
    mota: f64,
    motp: f64,
    precision: f64,
    recall: f64,
}

#[derive(Debug, Deserialize)]
struct CountsJson {
    name: String,
    num_objects: usize,
    num_matches: usize,
    num_misses: usize,
    num_false_positives: usize,
    num_switches: usize,
    num_fragmentations: usize,
}

// ============================================================================
// Test Helpers
// ============================================================================

fn find_fixture_dir(name: &str) -> PathBuf {
    // Try various locations relative to where tests run
    let candidates = [
        PathBuf::from("testdata/fixtures"),
        PathBuf::from("../testdata/fixtures"),
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/fixtures"),
    ];

    for candidate in &candidates {
        let dir = candidate.join(name);
        if dir.exists() {
            return dir;
        }
    }
    panic!("Could not find fixture directory testdata/fixtures/{}", name);
}

fn load_expected(dir: &PathBuf) -> Expected {
    let path = dir.join("expected.json");
    let content = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture file {:?}: {}", path, e));

    serde_json::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse fixture file {:?}: {}", path, e))
}

fn row_index(name: &str) -> usize {
    Joint::iter()
        .position(|j| j.name() == name)
        .unwrap_or_else(|| if name == "total" { Joint::ALL.len() } else { panic!("unknown row {}", name) })
}

fn assert_close(label: &str, expected: f64, actual: f64) {
    assert!(
        (expected - actual).abs() <= TOLERANCE,
        "{}: expected {}, got {}",
        label,
        expected,
        actual
    );
}

fn compare_ap(expected: &Expected, table: &APTable) {
    for row in &expected.ap {
        let actual = &table.rows()[row_index(&row.name)];
        assert_eq!(actual.name, row.name);
        assert_close(&format!("{} ap", row.name), row.ap, actual.ap);
        assert_close(&format!("{} precision", row.name), row.precision, actual.precision);
        assert_close(&format!("{} recall", row.name), row.recall, actual.recall);
    }

    let excluded: Vec<String> = table.excluded().iter().map(|s| s.to_string()).collect();
    assert_eq!(excluded, expected.excluded);
    for name in &expected.excluded {
        assert!(table.rows()[row_index(name)].ap.is_nan(), "{} should be NaN", name);
    }
}

fn compare_mot(expected: &Expected, table: &MOTTable) {
    for row in &expected.mot {
        let actual = &table.rows()[row_index(&row.name)];
        assert_close(&format!("{} mota", row.name), row.mota, actual.mota);
        assert_close(&format!("{} motp", row.name), row.motp, actual.motp);
        assert_close(&format!("{} precision", row.name), row.precision, actual.precision);
        assert_close(&format!("{} recall", row.name), row.recall, actual.recall);
    }

    for exp in &expected.counts {
        let actual = &table.counts()[row_index(&exp.name)];
        assert_eq!(actual.num_objects, exp.num_objects, "{} objects", exp.name);
        assert_eq!(actual.num_matches, exp.num_matches, "{} matches", exp.name);
        assert_eq!(actual.num_misses, exp.num_misses, "{} misses", exp.name);
        assert_eq!(actual.num_false_positives, exp.num_false_positives, "{} false positives", exp.name);
        assert_eq!(actual.num_switches, exp.num_switches, "{} switches", exp.name);
        assert_eq!(actual.num_fragmentations, exp.num_fragmentations, "{} fragmentations", exp.name);
    }

    let excluded: Vec<String> = table.excluded().iter().map(|s| s.to_string()).collect();
    assert_eq!(excluded, expected.excluded);
}

fn run_fixture(name: &str) {
    let dir = find_fixture_dir(name);
    let expected = load_expected(&dir);

    let config = EvalConfig {
        save_per_sequence: true,
        ..EvalConfig::default()
    };
    let pairs = load_directories(dir.join("groundtruth"), dir.join("predictions"), &config)
        .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e));
    let evaluator = Evaluator::new(config).unwrap();

    let pose = evaluator.evaluate_pose(&pairs).unwrap();
    compare_ap(&expected, &pose.total);
    assert_eq!(pose.per_sequence.len(), pairs.len());

    let tracking = evaluator.evaluate_tracking(&pairs).unwrap();
    compare_mot(&expected, &tracking.total);
    assert_eq!(tracking.per_sequence.len(), pairs.len());
}

// ============================================================================
// Fixture Tests
// ============================================================================

#[test]
fn test_fixture_two_sequences() {
    run_fixture("two_sequences");
}

#[test]
fn test_fixture_identity_switch() {
    run_fixture("identity_switch");
}

#[test]
fn test_fixture_sequential_matches_parallel() {
    let dir = find_fixture_dir("two_sequences");
    let serial = EvalConfig {
        parallel: false,
        ..EvalConfig::default()
    };
    let pairs = load_directories(dir.join("groundtruth"), dir.join("predictions"), &serial).unwrap();

    let a = Evaluator::new(serial).unwrap().evaluate_tracking(&pairs).unwrap();
    let b = Evaluator::new(EvalConfig::default()).unwrap().evaluate_tracking(&pairs).unwrap();
    assert_eq!(
        serde_json::to_string(&a.total).unwrap(),
        serde_json::to_string(&b.total).unwrap()
    );
}

#[test]
fn test_fixture_saved_results() {
    let dir = find_fixture_dir("two_sequences");
    let config = EvalConfig {
        save_per_sequence: true,
        ..EvalConfig::default()
    };
    let pairs = load_directories(dir.join("groundtruth"), dir.join("predictions"), &config).unwrap();
    let evaluator = Evaluator::new(config).unwrap();

    let out = tempfile::tempdir().unwrap();
    evaluator.evaluate_pose(&pairs).unwrap().save(out.path()).unwrap();
    evaluator.evaluate_tracking(&pairs).unwrap().save(out.path()).unwrap();

    for file in [
        "total_AP_metrics.json",
        "seq_a_AP_metrics.json",
        "seq_b_AP_metrics.json",
        "total_MOT_metrics.json",
        "seq_a_MOT_metrics.json",
        "seq_b_MOT_metrics.json",
    ] {
        assert!(out.path().join(file).exists(), "missing {}", file);
    }

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("total_AP_metrics.json")).unwrap()).unwrap();
    assert_eq!(saved["convention"], METRIC_CONVENTION);
    assert_eq!(saved["names"].as_array().unwrap().len(), Joint::ALL.len() + 1);

    // Joints without ground truth are written as null
    let rows = saved["metrics"]["rows"].as_array().unwrap();
    assert!(rows[Joint::RightAnkle.index()]["ap"].is_null());
    assert_close("saved neck ap", 4.0 / 9.0, rows[Joint::Neck.index()]["ap"].as_f64().unwrap());

    // Only seq_b has no predicted neck in its scored frame
    let seq_b: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.path().join("seq_b_AP_metrics.json")).unwrap()).unwrap();
    assert_eq!(seq_b["metrics"]["rows"][Joint::Neck.index()]["ap"].as_f64(), Some(0.0));
}
