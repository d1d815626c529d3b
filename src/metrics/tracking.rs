//! Identity tracking across the frames of one sequence.
//!
//! Builds on the per-frame [`FrameMatch`]: a ground-truth joint is tracked in
//! a frame when its person's matched prediction localizes the joint within the
//! threshold. Over time, each (joint, ground-truth track) remembers the last
//! predicted track id it was matched to, which is how identity switches are
//! detected. A miss does not clear that memory.

use std::collections::HashMap;

use serde::Serialize;

use crate::annotation::Person;
use crate::joints::{Joint, NUM_JOINTS};
use crate::matching::FrameMatch;
use crate::{Error, Result};

/// Per-joint tracking event counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrackingCounts {
    /// Ground-truth joint instances in scored frames.
    pub num_objects: usize,
    /// Correctly localized instances, including those with an identity switch.
    pub num_matches: usize,
    pub num_misses: usize,
    pub num_false_positives: usize,
    pub num_switches: usize,
    pub num_fragmentations: usize,
    /// Sum of normalized distances over matches (for MOTP).
    pub total_distance: f64,
}

impl TrackingCounts {
    /// Count one ground-truth observation.
    ///
    /// A switch is also a match; `distance` is only summed for matches.
    pub fn record(&mut self, event: EventType, distance: f64, fragmented: bool) {
        match event {
            EventType::Match | EventType::Switch => {
                self.num_matches += 1;
                self.total_distance += distance;
                if event == EventType::Switch {
                    self.num_switches += 1;
                }
                if fragmented {
                    self.num_fragmentations += 1;
                }
            }
            EventType::Miss => self.num_misses += 1,
        }
    }

    pub fn merge(&mut self, other: &TrackingCounts) {
        self.num_objects += other.num_objects;
        self.num_matches += other.num_matches;
        self.num_misses += other.num_misses;
        self.num_false_positives += other.num_false_positives;
        self.num_switches += other.num_switches;
        self.num_fragmentations += other.num_fragmentations;
        self.total_distance += other.total_distance;
    }
}

/// Classification of one ground-truth joint instance in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Match,
    Switch,
    Miss,
}

/// Lifecycle of one ground-truth track for one joint.
#[derive(Debug, Clone, Default)]
struct TrackLifecycle {
    /// Predicted id of the last match; kept through misses.
    last_prediction: Option<i64>,
    /// Was the track matched in its previous observation?
    was_matched: bool,
    /// Has the track been matched at all?
    ever_matched: bool,
}

impl TrackLifecycle {
    /// Record a match and return `(event, fragmented)`.
    fn update_matched(&mut self, prediction: i64) -> (EventType, bool) {
        let fragmented = self.ever_matched && !self.was_matched;
        let event = match self.last_prediction {
            Some(prev) if prev != prediction => EventType::Switch,
            _ => EventType::Match,
        };

        self.last_prediction = Some(prediction);
        self.was_matched = true;
        self.ever_matched = true;
        (event, fragmented)
    }

    fn update_missed(&mut self) -> EventType {
        self.was_matched = false;
        EventType::Miss
    }
}

/// Identity tracker for one sequence.
///
/// Feed scored frames in temporal order with [`IdentityTracker::update`].
#[derive(Debug)]
pub struct IdentityTracker {
    sequence: String,
    /// Number of frames processed so far
    frame_id: usize,
    counts: Vec<TrackingCounts>,
    lifecycles: Vec<HashMap<i64, TrackLifecycle>>,
}

impl IdentityTracker {
    pub fn new(sequence: &str) -> Self {
        Self {
            sequence: sequence.to_string(),
            frame_id: 0,
            counts: vec![TrackingCounts::default(); NUM_JOINTS],
            lifecycles: vec![HashMap::new(); NUM_JOINTS],
        }
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn num_frames(&self) -> usize {
        self.frame_id
    }

    /// Update the tracker with the next scored frame.
    ///
    /// # Arguments
    /// * `gt` - Ground-truth persons, each with a track id
    /// * `pr` - Predicted persons, each with a track id
    /// * `frame_match` - Result of matching `pr` to `gt`
    pub fn update(&mut self, gt: &[Person], pr: &[Person], frame_match: &FrameMatch) -> Result<()> {
        let gt_ids = self.track_ids(gt)?;
        let pr_ids = self.track_ids(pr)?;

        for joint in Joint::iter() {
            let j = joint.index();
            let mut detected = vec![false; pr.len()];

            for (gt_idx, person) in gt.iter().enumerate() {
                if !person.has_joint(joint) {
                    continue;
                }
                self.counts[j].num_objects += 1;

                let lifecycle = self.lifecycles[j].entry(gt_ids[gt_idx]).or_default();
                let (event, distance, fragmented) = match frame_match.correct_joint(joint, gt_idx) {
                    Some((pr_idx, dist)) => {
                        detected[pr_idx] = true;
                        let (event, fragmented) = lifecycle.update_matched(pr_ids[pr_idx]);
                        (event, dist, fragmented)
                    }
                    None => (lifecycle.update_missed(), 0.0, false),
                };
                self.counts[j].record(event, distance, fragmented);
            }

            // Predicted joints that did not localize a ground-truth joint
            self.counts[j].num_false_positives += pr
                .iter()
                .zip(&detected)
                .filter(|(p, &hit)| p.has_joint(joint) && !hit)
                .count();
        }

        self.frame_id += 1;
        Ok(())
    }

    /// Counts accumulated so far, indexed by joint.
    pub fn counts(&self) -> &[TrackingCounts] {
        &self.counts
    }

    pub fn joint_counts(&self, joint: Joint) -> &TrackingCounts {
        &self.counts[joint.index()]
    }

    /// Consume the tracker and return its counts.
    pub fn finish(self) -> Vec<TrackingCounts> {
        self.counts
    }

    fn track_ids(&self, persons: &[Person]) -> Result<Vec<i64>> {
        persons
            .iter()
            .map(|p| {
                p.track_id.ok_or_else(|| Error::MissingTrackId {
                    sequence: self.sequence.clone(),
                    frame: self.frame_id,
                })
            })
            .collect()
    }
}
