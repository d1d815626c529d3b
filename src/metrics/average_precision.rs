//! Average precision accumulation for per-frame pose estimation.

use crate::annotation::Person;
use crate::joints::{Joint, NUM_JOINTS};
use crate::matching::{by_confidence_desc, num_annotated, FrameMatch, JointDecision};

use super::APTable;

/// A precision/recall curve, one point per sorted decision.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrecisionRecall {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
}

impl PrecisionRecall {
    pub fn is_empty(&self) -> bool {
        self.precision.is_empty()
    }

    /// Precision and recall at the last sweep position.
    pub fn operating_point(&self) -> Option<(f64, f64)> {
        Some((*self.precision.last()?, *self.recall.last()?))
    }
}

/// Sweep decisions by descending confidence and build the precision/recall curve.
///
/// The sort is stable, so equal confidences keep their accumulation order.
/// With `num_gt == 0` every recall value is NaN.
pub fn precision_recall_curve(decisions: &[JointDecision], num_gt: usize) -> PrecisionRecall {
    let mut sorted = decisions.to_vec();
    sorted.sort_by(by_confidence_desc);

    let mut curve = PrecisionRecall {
        precision: Vec::with_capacity(sorted.len()),
        recall: Vec::with_capacity(sorted.len()),
    };

    let mut tp = 0usize;
    let mut fp = 0usize;
    for decision in &sorted {
        if decision.true_positive {
            tp += 1;
        } else {
            fp += 1;
        }
        curve.precision.push(tp as f64 / (tp + fp) as f64);
        curve.recall.push(if num_gt == 0 {
            f64::NAN
        } else {
            tp as f64 / num_gt as f64
        });
    }

    curve
}

/// Make precision non-increasing as recall grows (right-to-left running max).
pub fn precision_envelope(precision: &mut [f64]) {
    for i in (0..precision.len().saturating_sub(1)).rev() {
        precision[i] = precision[i].max(precision[i + 1]);
    }
}

/// Area under the precision envelope, integrated exactly over the recall steps.
///
/// Sentinels (recall 0, precision 0) and (recall 1, precision 0) are added
/// before the envelope is taken.
pub fn voc_average_precision(recall: &[f64], precision: &[f64]) -> f64 {
    let mut mrec = Vec::with_capacity(recall.len() + 2);
    mrec.push(0.0);
    mrec.extend_from_slice(recall);
    mrec.push(1.0);

    let mut mpre = Vec::with_capacity(precision.len() + 2);
    mpre.push(0.0);
    mpre.extend_from_slice(precision);
    mpre.push(0.0);

    precision_envelope(&mut mpre);

    (1..mrec.len())
        .filter(|&i| mrec[i] != mrec[i - 1])
        .map(|i| (mrec[i] - mrec[i - 1]) * mpre[i])
        .sum()
}

/// Collects per-joint decisions and ground-truth counts across frames.
///
/// One accumulator per sequence can be built independently and combined
/// with [`APAccumulator::merge`].
#[derive(Debug, Clone)]
pub struct APAccumulator {
    decisions: Vec<Vec<JointDecision>>,
    num_gt: Vec<usize>,
    num_frames: usize,
}

impl Default for APAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl APAccumulator {
    pub fn new() -> Self {
        Self {
            decisions: vec![Vec::new(); NUM_JOINTS],
            num_gt: vec![0; NUM_JOINTS],
            num_frames: 0,
        }
    }

    /// Add one matched frame.
    ///
    /// # Arguments
    /// * `gt` - Ground-truth persons of the frame
    /// * `pr` - Predicted persons of the frame
    /// * `frame_match` - Result of matching `pr` to `gt`
    pub fn update(&mut self, gt: &[Person], pr: &[Person], frame_match: &FrameMatch) {
        for joint in Joint::iter() {
            self.num_gt[joint.index()] += num_annotated(gt, joint);
            self.decisions[joint.index()].extend(frame_match.joint_decisions(pr, joint));
        }
        self.num_frames += 1;
    }

    /// Append another accumulator's decisions after this one's.
    pub fn merge(&mut self, other: &APAccumulator) {
        for j in 0..NUM_JOINTS {
            self.decisions[j].extend_from_slice(&other.decisions[j]);
            self.num_gt[j] += other.num_gt[j];
        }
        self.num_frames += other.num_frames;
    }

    pub fn num_ground_truth(&self, joint: Joint) -> usize {
        self.num_gt[joint.index()]
    }

    pub fn decisions(&self, joint: Joint) -> &[JointDecision] {
        &self.decisions[joint.index()]
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    /// Precision/recall curve for one joint.
    pub fn curve(&self, joint: Joint) -> PrecisionRecall {
        precision_recall_curve(&self.decisions[joint.index()], self.num_gt[joint.index()])
    }

    /// Compute AP, precision and recall per joint and in total.
    pub fn compute(&self) -> APTable {
        let mut values = Vec::with_capacity(NUM_JOINTS);
        let mut defined = Vec::with_capacity(NUM_JOINTS);

        for joint in Joint::iter() {
            if self.num_ground_truth(joint) == 0 {
                values.push((f64::NAN, f64::NAN, f64::NAN));
                defined.push(false);
                continue;
            }

            let curve = self.curve(joint);
            let row = match curve.operating_point() {
                Some((precision, recall)) => {
                    (voc_average_precision(&curve.recall, &curve.precision), precision, recall)
                }
                None => (0.0, 0.0, 0.0),
            };
            values.push(row);
            defined.push(true);
        }

        APTable::from_joint_values(&values, &defined)
    }
}
