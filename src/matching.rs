//! Per-frame matching of predicted poses to ground-truth poses.
//!
//! Candidate `(gt, prediction)` pairs are scored with PCKh: the fraction of
//! the ground-truth person's visible joints that the prediction places within
//! `threshold` head sizes. Pairs are then assigned greedily, best score first.
//! The greedy rule and its tie-break order define the benchmark numbers, so
//! this is intentionally not an optimal assignment.

use std::cmp::Ordering;

use nalgebra::DMatrix;

use crate::annotation::Person;
use crate::joints::Joint;

/// A matched ground-truth / prediction pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseMatch {
    /// Index into the frame's ground-truth persons.
    pub gt: usize,
    /// Index into the frame's predicted persons.
    pub pr: usize,
    /// PCKh score of the pair.
    pub score: f64,
}

/// Outcome of one predicted joint: its confidence and whether it is correct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointDecision {
    pub confidence: f64,
    pub true_positive: bool,
}

/// Normalized distance from a ground-truth person to a predicted person for one joint.
///
/// Infinite when either point is missing or the ground truth has no usable scale.
pub fn normalized_distance(gt: &Person, pr: &Person, joint: Joint) -> f64 {
    let (Some(g), Some(p)) = (gt.keypoint(joint), pr.keypoint(joint)) else {
        return f64::INFINITY;
    };

    match gt.scale {
        Some(scale) if scale > 0.0 => nalgebra::distance(&g.position, &p.position) / scale,
        _ => f64::INFINITY,
    }
}

/// Per-joint distance matrices (n_gt x n_pr), one per joint.
pub fn joint_distances(gt: &[Person], pr: &[Person]) -> Vec<DMatrix<f64>> {
    Joint::iter()
        .map(|joint| {
            DMatrix::from_fn(gt.len(), pr.len(), |i, j| normalized_distance(&gt[i], &pr[j], joint))
        })
        .collect()
}

/// Number of ground-truth persons annotated for `joint`.
pub fn num_annotated(gt: &[Person], joint: Joint) -> usize {
    gt.iter().filter(|p| p.has_joint(joint)).count()
}

/// Greedy matcher with a fixed PCKh threshold.
#[derive(Debug, Clone, Copy)]
pub struct PoseMatcher {
    threshold: f64,
}

impl PoseMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Match the predicted persons of one frame to its ground-truth persons.
    ///
    /// # Arguments
    /// * `gt` - Ground-truth persons of the frame
    /// * `pr` - Predicted persons of the same frame
    ///
    /// # Returns
    /// A [`FrameMatch`] with the bijective partial assignment and the
    /// per-joint distances it was computed from.
    pub fn match_frame(&self, gt: &[Person], pr: &[Person]) -> FrameMatch {
        let distances = joint_distances(gt, pr);
        let scores = self.pair_scores(gt, pr, &distances);

        // Collect candidate (score, gt_idx, pr_idx) pairs
        let mut candidates: Vec<(f64, usize, usize)> = Vec::new();
        for i in 0..gt.len() {
            for j in 0..pr.len() {
                let score = scores[(i, j)];
                if score > 0.0 {
                    candidates.push((score, i, j));
                }
            }
        }

        let confidences: Vec<f64> = pr.iter().map(Person::confidence).collect();
        candidates.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| confidences[b.2].total_cmp(&confidences[a.2]))
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });

        let mut gt_to_pr = vec![None; gt.len()];
        let mut pr_to_gt = vec![None; pr.len()];
        let mut matches = Vec::new();

        for (score, gt_idx, pr_idx) in candidates {
            if gt_to_pr[gt_idx].is_some() || pr_to_gt[pr_idx].is_some() {
                continue;
            }

            gt_to_pr[gt_idx] = Some(pr_idx);
            pr_to_gt[pr_idx] = Some(gt_idx);
            matches.push(PoseMatch { gt: gt_idx, pr: pr_idx, score });
        }

        FrameMatch {
            threshold: self.threshold,
            matches,
            gt_to_pr,
            pr_to_gt,
            distances,
        }
    }

    /// PCKh score for every (gt, pr) pair.
    fn pair_scores(&self, gt: &[Person], pr: &[Person], distances: &[DMatrix<f64>]) -> DMatrix<f64> {
        DMatrix::from_fn(gt.len(), pr.len(), |i, j| {
            let visible = gt[i].num_visible();
            if visible == 0 {
                return 0.0;
            }
            let correct = distances
                .iter()
                .filter(|d| d[(i, j)] <= self.threshold)
                .count();
            correct as f64 / visible as f64
        })
    }
}

/// Result of matching one frame.
#[derive(Debug, Clone)]
pub struct FrameMatch {
    threshold: f64,
    matches: Vec<PoseMatch>,
    gt_to_pr: Vec<Option<usize>>,
    pr_to_gt: Vec<Option<usize>>,
    distances: Vec<DMatrix<f64>>,
}

impl FrameMatch {
    /// Matched pairs in assignment order.
    pub fn matches(&self) -> &[PoseMatch] {
        &self.matches
    }

    pub fn num_matches(&self) -> usize {
        self.matches.len()
    }

    /// Prediction matched to ground-truth person `gt`.
    pub fn prediction_for(&self, gt: usize) -> Option<usize> {
        self.gt_to_pr.get(gt).copied().flatten()
    }

    /// Ground-truth person matched to prediction `pr`.
    pub fn ground_truth_for(&self, pr: usize) -> Option<usize> {
        self.pr_to_gt.get(pr).copied().flatten()
    }

    /// Normalized distance between `gt` and `pr` for `joint`.
    pub fn distance(&self, joint: Joint, gt: usize, pr: usize) -> f64 {
        self.distances[joint.index()][(gt, pr)]
    }

    /// Whether `joint` of ground-truth person `gt` is correctly localized by its match.
    ///
    /// Returns the matched prediction index and distance when it is.
    pub fn correct_joint(&self, joint: Joint, gt: usize) -> Option<(usize, f64)> {
        let pr = self.prediction_for(gt)?;
        let dist = self.distance(joint, gt, pr);
        (dist <= self.threshold).then_some((pr, dist))
    }

    /// One decision per predicted person that has `joint`.
    ///
    /// A decision is a true positive when the person is matched and its joint
    /// lies within the threshold of the matched ground truth.
    pub fn joint_decisions(&self, pr: &[Person], joint: Joint) -> Vec<JointDecision> {
        pr.iter()
            .enumerate()
            .filter_map(|(pr_idx, person)| {
                let confidence = person.joint_confidence(joint)?;
                let true_positive = self
                    .ground_truth_for(pr_idx)
                    .map(|gt_idx| self.distance(joint, gt_idx, pr_idx) <= self.threshold)
                    .unwrap_or(false);
                Some(JointDecision { confidence, true_positive })
            })
            .collect()
    }
}

/// Order used for sorting decisions: higher confidence first.
pub(crate) fn by_confidence_desc(a: &JointDecision, b: &JointDecision) -> Ordering {
    b.confidence.total_cmp(&a.confidence)
}
