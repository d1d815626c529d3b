//! Pose estimation and pose tracking metrics.
//!
//! This module provides:
//!
//! - `APAccumulator` - Per-joint average precision over matched frames
//! - `IdentityTracker` - Identity switches, misses and false positives over time
//! - `MOTAccumulator` - MOTA / MOTP / precision / recall from tracking counts
//! - `Evaluator` - Per-sequence evaluation, merging and persistence

mod table;
mod average_precision;
mod tracking;
mod mot;
mod evaluation;

pub use table::{APRow, APTable, MOTRow, MOTTable};
pub use average_precision::{
    precision_envelope, precision_recall_curve, voc_average_precision, APAccumulator,
    PrecisionRecall,
};
pub use tracking::{EventType, IdentityTracker, TrackingCounts};
pub use mot::{mota, motp, MOTAccumulator};
pub use evaluation::{Evaluator, PoseEvaluation, TrackingEvaluation};
