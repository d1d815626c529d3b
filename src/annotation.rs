//! In-memory pose annotations: keypoints, persons, frames and sequences.
//!
//! Ground truth and predictions share the same types. Ground-truth persons
//! carry a `scale` (head size) used to normalize distances; predictions carry
//! confidence scores. Both may carry a `track_id` for the tracking task.

use std::collections::HashSet;

use nalgebra::Point2;

use crate::joints::{Joint, NUM_JOINTS};
use crate::{Error, Result};

/// A single annotated or predicted joint location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Image coordinates of the joint.
    pub position: Point2<f64>,
    /// Optional per-joint confidence (predictions only).
    pub score: Option<f64>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            score: None,
        }
    }

    pub fn with_score(x: f64, y: f64, score: f64) -> Self {
        Self {
            position: Point2::new(x, y),
            score: Some(score),
        }
    }
}

/// One person in one frame: exactly [`NUM_JOINTS`] keypoint slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    keypoints: Vec<Option<Keypoint>>,

    /// Person-level confidence (predictions only).
    pub score: Option<f64>,

    /// Distance normalization factor (ground truth only, PoseTrack head size).
    pub scale: Option<f64>,

    /// Track identifier; only equality is meaningful.
    pub track_id: Option<i64>,
}

impl Person {
    /// Create a person from a full keypoint vector.
    ///
    /// # Arguments
    /// * `keypoints` - One slot per joint in index order, `None` for absent joints
    pub fn new(keypoints: Vec<Option<Keypoint>>) -> Result<Self> {
        if keypoints.len() != NUM_JOINTS {
            return Err(Error::JointCountMismatch {
                expected: NUM_JOINTS,
                got: keypoints.len(),
            });
        }

        Ok(Self {
            keypoints,
            score: None,
            scale: None,
            track_id: None,
        })
    }

    /// A person with every joint absent.
    pub fn empty() -> Self {
        Self {
            keypoints: vec![None; NUM_JOINTS],
            score: None,
            scale: None,
            track_id: None,
        }
    }

    /// Build a person from `(joint, keypoint)` pairs; unlisted joints are absent.
    pub fn from_keypoints<I: IntoIterator<Item = (Joint, Keypoint)>>(keypoints: I) -> Self {
        let mut person = Self::empty();
        for (joint, keypoint) in keypoints {
            person.set_keypoint(joint, Some(keypoint));
        }
        person
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_track_id(mut self, track_id: i64) -> Self {
        self.track_id = Some(track_id);
        self
    }

    pub fn set_keypoint(&mut self, joint: Joint, keypoint: Option<Keypoint>) {
        self.keypoints[joint.index()] = keypoint;
    }

    pub fn keypoint(&self, joint: Joint) -> Option<&Keypoint> {
        self.keypoints[joint.index()].as_ref()
    }

    /// All keypoint slots in joint index order.
    pub fn keypoints(&self) -> &[Option<Keypoint>] {
        &self.keypoints
    }

    pub fn has_joint(&self, joint: Joint) -> bool {
        self.keypoints[joint.index()].is_some()
    }

    /// Number of present joints.
    pub fn num_visible(&self) -> usize {
        self.keypoints.iter().filter(|k| k.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.num_visible() == 0
    }

    /// Confidence of the whole person: its own score, else the mean keypoint score.
    pub fn confidence(&self) -> f64 {
        if let Some(score) = self.score {
            return score;
        }

        let scores: Vec<f64> = self.keypoints.iter().flatten().filter_map(|k| k.score).collect();
        if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    /// Confidence of one joint: the keypoint score, else the person score.
    pub fn joint_confidence(&self, joint: Joint) -> Option<f64> {
        self.keypoint(joint).and_then(|k| k.score.or(self.score))
    }

    /// Drop every keypoint for which `keep` returns false.
    pub fn retain_keypoints<F: FnMut(&Keypoint) -> bool>(&mut self, mut keep: F) {
        for slot in self.keypoints.iter_mut() {
            if matches!(slot, Some(k) if !keep(k)) {
                *slot = None;
            }
        }
    }
}

/// One image of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Sequence-relative index; establishes temporal order.
    pub index: usize,
    /// Image file name, if known.
    pub image: Option<String>,
    pub persons: Vec<Person>,
    /// Whether the frame is scored. Unlabeled ground-truth frames are skipped.
    pub evaluate: bool,
}

impl Frame {
    pub fn new(index: usize, persons: Vec<Person>) -> Self {
        Self {
            index,
            image: None,
            persons,
            evaluate: true,
        }
    }

    /// A frame that is annotated but excluded from scoring.
    pub fn skipped(index: usize, persons: Vec<Person>) -> Self {
        Self {
            evaluate: false,
            ..Self::new(index, persons)
        }
    }
}

/// A named, temporally ordered list of frames from one source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub name: String,
    pub frames: Vec<Frame>,
}

impl Sequence {
    pub fn new<S: Into<String>>(name: S, frames: Vec<Frame>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Ground truth and predictions for the same video, validated to be comparable.
#[derive(Debug, Clone)]
pub struct SequencePair {
    name: String,
    ground_truth: Vec<Frame>,
    predictions: Vec<Frame>,
}

impl SequencePair {
    /// Pair two sequences.
    ///
    /// Fails when the names or frame counts differ, when a ground-truth person
    /// has joints but no positive scale, or when a predicted joint has no
    /// confidence.
    pub fn new(ground_truth: Sequence, predictions: Sequence) -> Result<Self> {
        if ground_truth.name != predictions.name {
            return Err(Error::SequenceMismatch(format!(
                "ground truth '{}' paired with predictions '{}'",
                ground_truth.name, predictions.name
            )));
        }

        if ground_truth.len() != predictions.len() {
            return Err(Error::FrameCountMismatch {
                sequence: ground_truth.name.clone(),
                ground_truth: ground_truth.len(),
                predictions: predictions.len(),
            });
        }

        let name = ground_truth.name;
        for frame in &ground_truth.frames {
            for person in &frame.persons {
                let valid_scale = matches!(person.scale, Some(s) if s.is_finite() && s > 0.0);
                if !person.is_empty() && !valid_scale {
                    return Err(Error::annotation(
                        &name,
                        format!("frame {}: ground-truth person without a valid head size", frame.index),
                    ));
                }
            }
        }

        for frame in &predictions.frames {
            for person in &frame.persons {
                for joint in Joint::iter().filter(|&j| person.has_joint(j)) {
                    if person.joint_confidence(joint).is_none() {
                        return Err(Error::annotation(
                            &name,
                            format!("frame {}: predicted {} has no confidence score", frame.index, joint),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            name,
            ground_truth: ground_truth.frames,
            predictions: predictions.frames,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ground_truth(&self) -> &[Frame] {
        &self.ground_truth
    }

    pub fn predictions(&self) -> &[Frame] {
        &self.predictions
    }

    pub fn num_frames(&self) -> usize {
        self.ground_truth.len()
    }

    /// `(ground truth, predictions)` for every frame that is scored, in order.
    pub fn evaluated_frames(&self) -> impl Iterator<Item = (&Frame, &Frame)> + '_ {
        self.ground_truth
            .iter()
            .zip(self.predictions.iter())
            .filter(|(gt, _)| gt.evaluate)
    }

    /// Check the track identifiers required by the tracking task.
    ///
    /// Every person of every scored frame needs a track id, unique within its
    /// frame and source.
    pub fn validate_tracking(&self) -> Result<()> {
        for (gt, pr) in self.evaluated_frames() {
            self.check_track_ids(gt)?;
            self.check_track_ids(pr)?;
        }
        Ok(())
    }

    fn check_track_ids(&self, frame: &Frame) -> Result<()> {
        let mut seen = HashSet::new();
        for person in &frame.persons {
            let track_id = person.track_id.ok_or_else(|| Error::MissingTrackId {
                sequence: self.name.clone(),
                frame: frame.index,
            })?;

            if !seen.insert(track_id) {
                return Err(Error::DuplicateTrackId {
                    sequence: self.name.clone(),
                    frame: frame.index,
                    track_id,
                });
            }
        }
        Ok(())
    }
}
