//! Evaluation driver: per-sequence partial results, merge, persistence.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::{APAccumulator, APTable, IdentityTracker, MOTAccumulator, MOTTable, TrackingCounts};
use crate::annotation::SequencePair;
use crate::config::{EvalConfig, METRIC_CONVENTION};
use crate::joints::row_names;
use crate::matching::PoseMatcher;
use crate::{Error, Result};

/// Pose estimation results: merged totals and optional per-sequence tables.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseEvaluation {
    pub total: APTable,
    pub per_sequence: Vec<(String, APTable)>,
}

/// Pose tracking results: merged totals and optional per-sequence tables.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingEvaluation {
    pub total: MOTTable,
    pub per_sequence: Vec<(String, MOTTable)>,
}

/// Contents of a persisted metrics file.
#[derive(Serialize)]
struct MetricsFile<'a, T: Serialize> {
    convention: &'static str,
    names: Vec<&'static str>,
    metrics: &'a T,
}

impl PoseEvaluation {
    /// Write `total_AP_metrics.json` and one `<sequence>_AP_metrics.json` per kept sequence.
    pub fn save<P: AsRef<Path>>(&self, output_dir: P) -> Result<()> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        for (name, table) in &self.per_sequence {
            write_metrics(&output_dir.join(format!("{}_AP_metrics.json", name)), table)?;
        }
        write_metrics(&output_dir.join("total_AP_metrics.json"), &self.total)
    }
}

impl TrackingEvaluation {
    /// Write `total_MOT_metrics.json` and one `<sequence>_MOT_metrics.json` per kept sequence.
    pub fn save<P: AsRef<Path>>(&self, output_dir: P) -> Result<()> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        for (name, table) in &self.per_sequence {
            write_metrics(&output_dir.join(format!("{}_MOT_metrics.json", name)), table)?;
        }
        write_metrics(&output_dir.join("total_MOT_metrics.json"), &self.total)
    }
}

fn write_metrics<T: Serialize>(path: &Path, metrics: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        Error::IoError(std::io::Error::new(
            e.kind(),
            format!("failed to create metrics file {}: {}", path.display(), e),
        ))
    })?;

    let contents = MetricsFile {
        convention: METRIC_CONVENTION,
        names: row_names(),
        metrics,
    };

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &contents).map_err(|source| Error::Json {
        path: path.display().to_string(),
        source,
    })?;
    writer.flush()?;
    Ok(())
}

/// Runs both evaluation pipelines over a set of sequences.
#[derive(Debug, Clone)]
pub struct Evaluator {
    config: EvalConfig,
    matcher: PoseMatcher,
}

impl Evaluator {
    pub fn new(config: EvalConfig) -> Result<Self> {
        config.validate()?;
        let matcher = PoseMatcher::new(config.distance_threshold);
        Ok(Self { config, matcher })
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// AP partial result for one sequence.
    pub fn accumulate_pose(&self, pair: &SequencePair) -> APAccumulator {
        let mut acc = APAccumulator::new();
        for (gt, pr) in pair.evaluated_frames() {
            let frame_match = self.matcher.match_frame(&gt.persons, &pr.persons);
            acc.update(&gt.persons, &pr.persons, &frame_match);
        }
        debug!(sequence = pair.name(), frames = acc.num_frames(), "accumulated pose decisions");
        acc
    }

    /// Tracking counts for one sequence.
    pub fn accumulate_tracking(&self, pair: &SequencePair) -> Result<Vec<TrackingCounts>> {
        pair.validate_tracking()?;

        let mut tracker = IdentityTracker::new(pair.name());
        for (gt, pr) in pair.evaluated_frames() {
            let frame_match = self.matcher.match_frame(&gt.persons, &pr.persons);
            tracker.update(&gt.persons, &pr.persons, &frame_match)?;
        }
        debug!(sequence = pair.name(), frames = tracker.num_frames(), "accumulated tracking events");
        Ok(tracker.finish())
    }

    /// Evaluate per-frame multi-person pose estimation (AP).
    pub fn evaluate_pose(&self, pairs: &[SequencePair]) -> Result<PoseEvaluation> {
        info!(sequences = pairs.len(), "evaluating multi-person pose estimation");

        let partials: Vec<APAccumulator> = self.map_sequences(pairs, |pair| Ok(self.accumulate_pose(pair)))?;

        let mut merged = APAccumulator::new();
        for partial in &partials {
            merged.merge(partial);
        }

        let total = merged.compute();
        report_excluded("AP", total.excluded());

        let per_sequence = if self.config.save_per_sequence {
            pairs
                .iter()
                .zip(&partials)
                .map(|(pair, partial)| (pair.name().to_string(), partial.compute()))
                .collect()
        } else {
            Vec::new()
        };

        Ok(PoseEvaluation { total, per_sequence })
    }

    /// Evaluate video-based multi-person pose tracking (MOTA/MOTP).
    pub fn evaluate_tracking(&self, pairs: &[SequencePair]) -> Result<TrackingEvaluation> {
        info!(sequences = pairs.len(), "evaluating multi-person pose tracking");

        let partials = self.map_sequences(pairs, |pair| self.accumulate_tracking(pair))?;

        let mut merged = MOTAccumulator::new(self.config.clip_negative_mota);
        for counts in &partials {
            merged.add(counts);
        }

        let total = merged.compute();
        report_excluded("MOT", total.excluded());

        let per_sequence = if self.config.save_per_sequence {
            pairs
                .iter()
                .zip(&partials)
                .map(|(pair, counts)| {
                    let mut acc = MOTAccumulator::new(self.config.clip_negative_mota);
                    acc.add(counts);
                    (pair.name().to_string(), acc.compute())
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(TrackingEvaluation { total, per_sequence })
    }

    /// Apply `f` to every sequence, in parallel if configured; results keep input order.
    fn map_sequences<T, F>(&self, pairs: &[SequencePair], f: F) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&SequencePair) -> Result<T> + Sync + Send,
    {
        if self.config.parallel {
            pairs.par_iter().map(f).collect()
        } else {
            pairs.iter().map(f).collect()
        }
    }
}

fn report_excluded(task: &str, excluded: &[&'static str]) {
    if !excluded.is_empty() {
        warn!(
            "{}: joints without ground truth excluded from total: {}",
            task,
            excluded.join(", ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{Frame, Keypoint, Person, Sequence};
    use crate::joints::Joint;
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    fn pair(name: &str, with_prediction: bool) -> SequencePair {
        let gt = Person::from_keypoints([(Joint::Nose, Keypoint::new(5.0, 5.0))])
            .with_scale(10.0)
            .with_track_id(0);
        let pr = Person::from_keypoints([(Joint::Nose, Keypoint::with_score(5.0, 5.0, 0.9))])
            .with_track_id(3);
        let predictions = if with_prediction { vec![pr] } else { vec![] };

        SequencePair::new(
            Sequence::new(name, vec![Frame::new(0, vec![gt])]),
            Sequence::new(name, vec![Frame::new(0, predictions)]),
        )
        .unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EvalConfig {
            distance_threshold: -1.0,
            ..EvalConfig::default()
        };
        assert!(Evaluator::new(config).is_err());
    }

    #[test]
    fn test_per_sequence_tables() {
        let config = EvalConfig {
            save_per_sequence: true,
            ..EvalConfig::default()
        };
        let evaluator = Evaluator::new(config).unwrap();
        let pairs = vec![pair("good", true), pair("empty", false)];

        let pose = evaluator.evaluate_pose(&pairs).unwrap();
        assert_eq!(pose.per_sequence.len(), 2);
        assert_relative_eq!(pose.per_sequence[0].1.joint(Joint::Nose).ap, 1.0);
        assert_relative_eq!(pose.per_sequence[1].1.joint(Joint::Nose).ap, 0.0);
        assert_relative_eq!(pose.total.joint(Joint::Nose).ap, 0.5);

        let tracking = evaluator.evaluate_tracking(&pairs).unwrap();
        assert_eq!(tracking.per_sequence[1].0, "empty");
        assert_relative_eq!(tracking.total.joint(Joint::Nose).mota, 0.5);
    }

    #[test]
    fn test_parallel_matches_serial() {
        let pairs = vec![pair("a", true), pair("b", false), pair("c", true)];
        let parallel = Evaluator::new(EvalConfig::default()).unwrap();
        let serial = Evaluator::new(EvalConfig {
            parallel: false,
            ..EvalConfig::default()
        })
        .unwrap();

        // NaN rows make PartialEq unusable; compare the serialized tables
        let a = serde_json::to_string(&parallel.evaluate_pose(&pairs).unwrap().total).unwrap();
        let b = serde_json::to_string(&serial.evaluate_pose(&pairs).unwrap().total).unwrap();
        assert_eq!(a, b);

        let a = serde_json::to_string(&parallel.evaluate_tracking(&pairs).unwrap().total).unwrap();
        let b = serde_json::to_string(&serial.evaluate_tracking(&pairs).unwrap().total).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_save_writes_files() {
        let dir = tempdir().unwrap();
        let config = EvalConfig {
            save_per_sequence: true,
            ..EvalConfig::default()
        };
        let evaluator = Evaluator::new(config).unwrap();
        let pairs = vec![pair("seq1", true)];

        evaluator.evaluate_pose(&pairs).unwrap().save(dir.path()).unwrap();
        evaluator.evaluate_tracking(&pairs).unwrap().save(dir.path()).unwrap();

        for name in [
            "seq1_AP_metrics.json",
            "total_AP_metrics.json",
            "seq1_MOT_metrics.json",
            "total_MOT_metrics.json",
        ] {
            assert!(dir.path().join(name).exists(), "missing {}", name);
        }

        let contents = fs::read_to_string(dir.path().join("total_AP_metrics.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["convention"], METRIC_CONVENTION);
        assert_eq!(value["names"].as_array().unwrap().len(), 16);
        assert_eq!(value["metrics"]["rows"][13]["ap"], 1.0);
    }
}
