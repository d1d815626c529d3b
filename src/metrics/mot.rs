//! MOTA / MOTP computation from tracking counts.

use crate::joints::{Joint, NUM_JOINTS};
use crate::utils::ratio;

use super::table::MOTRow;
use super::{MOTTable, TrackingCounts};

/// MOTA = 1 - (misses + false positives + switches) / objects.
///
/// NaN when there are no objects. With `clip_negative` the result is floored at 0.
pub fn mota(counts: &TrackingCounts, clip_negative: bool) -> f64 {
    let errors = counts.num_misses + counts.num_false_positives + counts.num_switches;
    let value = 1.0 - ratio(errors as f64, counts.num_objects as f64);
    if clip_negative && value < 0.0 {
        0.0
    } else {
        value
    }
}

/// MOTP = mean normalized distance of the matches (0 is perfect).
pub fn motp(counts: &TrackingCounts) -> f64 {
    ratio(counts.total_distance, counts.num_matches as f64)
}

/// Precision = matches / (matches + false positives).
///
/// NaN when there are no objects, like the other metrics of that joint,
/// even if false positives were predicted.
pub fn precision(counts: &TrackingCounts) -> f64 {
    if counts.num_objects == 0 {
        return f64::NAN;
    }
    ratio(
        counts.num_matches as f64,
        (counts.num_matches + counts.num_false_positives) as f64,
    )
}

/// Recall = matches / objects.
pub fn recall(counts: &TrackingCounts) -> f64 {
    ratio(counts.num_matches as f64, counts.num_objects as f64)
}

/// Sums per-joint tracking counts over sequences and turns them into metrics.
#[derive(Debug, Clone)]
pub struct MOTAccumulator {
    counts: Vec<TrackingCounts>,
    clip_negative_mota: bool,
}

impl Default for MOTAccumulator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl MOTAccumulator {
    pub fn new(clip_negative_mota: bool) -> Self {
        Self {
            counts: vec![TrackingCounts::default(); NUM_JOINTS],
            clip_negative_mota,
        }
    }

    /// Add the per-joint counts of one sequence.
    pub fn add(&mut self, counts: &[TrackingCounts]) {
        for (total, c) in self.counts.iter_mut().zip(counts) {
            total.merge(c);
        }
    }

    pub fn merge(&mut self, other: &MOTAccumulator) {
        self.add(&other.counts);
    }

    pub fn counts(&self) -> &[TrackingCounts] {
        &self.counts
    }

    /// Compute MOTA, MOTP, precision and recall per joint and in total.
    ///
    /// A joint without ground truth has NaN metrics and is left out of the total.
    pub fn compute(&self) -> MOTTable {
        let rows = Joint::iter()
            .zip(&self.counts)
            .map(|(joint, c)| MOTRow {
                name: joint.name(),
                mota: mota(c, self.clip_negative_mota),
                motp: motp(c),
                precision: precision(c),
                recall: recall(c),
            })
            .collect();

        MOTTable::from_joint_rows(rows, self.counts.clone())
    }
}
