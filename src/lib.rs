//! # poseval-rs - Pose Estimation and Tracking Evaluation
//!
//! Scores multi-person human-pose predictions against ground-truth annotations
//! in the PoseTrack format.
//!
//! ## Features
//!
//! - Per-frame multi-person pose estimation: Average Precision (AP) per joint
//! - Video-based multi-person pose tracking: MOTA / MOTP / precision / recall
//! - Greedy PCKh-based person matching with deterministic tie-breaking
//! - Per-sequence partial results, merged deterministically (optionally in parallel)
//!
//! ## Example
//!
//! ```rust,ignore
//! use poseval_rs::{frame_store, EvalConfig, Evaluator};
//!
//! let config = EvalConfig::default();
//! let pairs = frame_store::load_directories("gt/", "pred/", &config)?;
//!
//! let evaluator = Evaluator::new(config)?;
//! let pose = evaluator.evaluate_pose(&pairs)?;
//! println!("total AP: {:.1}", pose.total.total().ap * 100.0);
//! ```

// Public modules
pub mod joints;
pub mod annotation;
pub mod config;
pub mod frame_store;
pub mod matching;
pub mod metrics;
pub mod report;
pub mod utils;

// Re-exports for convenience
pub use joints::{Joint, NUM_JOINTS};
pub use annotation::{Frame, Keypoint, Person, Sequence, SequencePair};
pub use config::{EvalConfig, METRIC_CONVENTION};
pub use matching::{FrameMatch, JointDecision, PoseMatch, PoseMatcher};
pub use metrics::{
    APAccumulator, APTable, Evaluator, IdentityTracker, MOTAccumulator, MOTTable,
    PoseEvaluation, TrackingCounts, TrackingEvaluation,
};

// Error types
pub use crate::error::{Error, Result};

mod error {
    use thiserror::Error;

    /// Errors that can occur while loading annotations or evaluating them.
    #[derive(Error, Debug)]
    pub enum Error {
        #[error("Invalid configuration: {0}")]
        InvalidConfig(String),

        #[error("Invalid annotation in {sequence}: {message}")]
        InvalidAnnotation { sequence: String, message: String },

        #[error("Invalid joint count: expected {expected}, got {got}")]
        JointCountMismatch { expected: usize, got: usize },

        #[error("Sequence mismatch: {0}")]
        SequenceMismatch(String),

        #[error("Frame count mismatch in {sequence}: {ground_truth} ground-truth frames, {predictions} prediction frames")]
        FrameCountMismatch {
            sequence: String,
            ground_truth: usize,
            predictions: usize,
        },

        #[error("Missing track id in {sequence}, frame {frame}")]
        MissingTrackId { sequence: String, frame: usize },

        #[error("Duplicate track id {track_id} in {sequence}, frame {frame}")]
        DuplicateTrackId {
            sequence: String,
            frame: usize,
            track_id: i64,
        },

        #[error("JSON error in {path}: {source}")]
        Json {
            path: String,
            #[source]
            source: serde_json::Error,
        },

        #[error("IO error: {0}")]
        IoError(#[from] std::io::Error),
    }

    impl Error {
        /// Construct an [`Error::InvalidAnnotation`].
        pub fn annotation<S: Into<String>, M: Into<String>>(sequence: S, message: M) -> Self {
            Error::InvalidAnnotation {
                sequence: sequence.into(),
                message: message.into(),
            }
        }
    }

    /// Result type for poseval operations
    pub type Result<T> = std::result::Result<T, Error>;
}
